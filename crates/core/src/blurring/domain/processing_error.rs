use thiserror::Error;

use crate::shared::image::PixelLayout;

/// Numeric error code delivered to error sinks.
pub type ErrorCode = i64;

pub const INVALID_KERNEL_SIZE: ErrorCode = -21767;
pub const MEMORY_ALLOCATION: ErrorCode = -21771;
pub const NULL_BUFFER: ErrorCode = -21772;
pub const INVALID_PARAMETER: ErrorCode = -21773;
pub const BUFFER_SIZE_MISMATCH: ErrorCode = -21774;

/// A blur that could not produce an image.
///
/// Every variant maps to a stable numeric [`ErrorCode`] so hosts that only
/// understand codes (notifications, FFI) can still tell failures apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("source image has no pixel data")]
    EmptyImage,
    #[error("unsupported pixel format: {channels} channels")]
    UnsupportedFormat { channels: usize },
    #[error("pixel buffer holds {actual} bytes, layout needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[error("{width}x{height}x{channels} image is too large to address")]
    LayoutOverflow {
        width: usize,
        height: usize,
        channels: usize,
    },
    #[error("box kernel width must be odd, got {0}")]
    InvalidKernelSize(u32),
    #[error("failed to allocate {bytes} bytes of pixel memory")]
    Allocation { bytes: usize },
    #[error("convolution primitive failed with code {code}")]
    Primitive { code: ErrorCode },
}

impl ProcessingError {
    pub(crate) fn layout_overflow(layout: PixelLayout) -> Self {
        Self::LayoutOverflow {
            width: layout.width,
            height: layout.height,
            channels: layout.channels,
        }
    }


    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyImage => NULL_BUFFER,
            Self::UnsupportedFormat { .. } | Self::LayoutOverflow { .. } => INVALID_PARAMETER,
            Self::BufferSizeMismatch { .. } => BUFFER_SIZE_MISMATCH,
            Self::InvalidKernelSize(_) => INVALID_KERNEL_SIZE,
            Self::Allocation { .. } => MEMORY_ALLOCATION,
            Self::Primitive { code } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProcessingError::EmptyImage, NULL_BUFFER)]
    #[case(ProcessingError::UnsupportedFormat { channels: 7 }, INVALID_PARAMETER)]
    #[case(ProcessingError::BufferSizeMismatch { expected: 12, actual: 10 }, BUFFER_SIZE_MISMATCH)]
    #[case(ProcessingError::LayoutOverflow { width: 1, height: 1, channels: 1 }, INVALID_PARAMETER)]
    #[case(ProcessingError::InvalidKernelSize(4), INVALID_KERNEL_SIZE)]
    #[case(ProcessingError::Allocation { bytes: 1 }, MEMORY_ALLOCATION)]
    #[case(ProcessingError::Primitive { code: -42 }, -42)]
    fn test_codes(#[case] err: ProcessingError, #[case] code: ErrorCode) {
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_display_mentions_details() {
        let err = ProcessingError::BufferSizeMismatch {
            expected: 12,
            actual: 10,
        };
        assert_eq!(err.to_string(), "pixel buffer holds 10 bytes, layout needs 12");
    }
}
