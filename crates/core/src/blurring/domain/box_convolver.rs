use crate::blurring::domain::processing_error::ProcessingError;
use crate::shared::image::PixelLayout;

/// Domain interface for the "convolve a buffer with a box kernel" primitive.
///
/// One call is one box pass of width `kernel_size` over the whole buffer.
/// `src` is never written; `dst` receives the result and `temp` is working
/// memory of at least [`temp_buffer_len`](BoxConvolver::temp_buffer_len)
/// bytes. Implementations must be deterministic.
pub trait BoxConvolver: Send + Sync {
    fn convolve(
        &self,
        src: &[u8],
        dst: &mut [u8],
        temp: &mut [u8],
        layout: PixelLayout,
        kernel_size: u32,
    ) -> Result<(), ProcessingError>;

    /// Only called with layouts whose byte length fits in `usize`.
    fn temp_buffer_len(&self, layout: PixelLayout) -> usize {
        layout.byte_len().unwrap_or(usize::MAX)
    }
}
