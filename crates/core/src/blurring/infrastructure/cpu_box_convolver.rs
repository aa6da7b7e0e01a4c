use crate::blurring::domain::box_convolver::BoxConvolver;
use crate::blurring::domain::processing_error::ProcessingError;
use crate::shared::image::PixelLayout;

/// CPU box convolver using a separable sliding-window sum.
///
/// Edges are extended (out-of-range samples repeat the nearest edge pixel).
/// Each pass costs O(pixels) regardless of kernel width, and all arithmetic
/// is integer, so identical inputs always give identical bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBoxConvolver;

impl CpuBoxConvolver {
    pub fn new() -> Self {
        Self
    }
}

impl BoxConvolver for CpuBoxConvolver {
    fn convolve(
        &self,
        src: &[u8],
        dst: &mut [u8],
        temp: &mut [u8],
        layout: PixelLayout,
        kernel_size: u32,
    ) -> Result<(), ProcessingError> {
        let len = layout
            .byte_len()
            .ok_or_else(|| ProcessingError::layout_overflow(layout))?;
        if len == 0 {
            return Err(ProcessingError::EmptyImage);
        }
        if kernel_size % 2 == 0 {
            return Err(ProcessingError::InvalidKernelSize(kernel_size));
        }
        for actual in [src.len(), dst.len()] {
            if actual != len {
                return Err(ProcessingError::BufferSizeMismatch {
                    expected: len,
                    actual,
                });
            }
        }
        if temp.len() < len {
            return Err(ProcessingError::BufferSizeMismatch {
                expected: len,
                actual: temp.len(),
            });
        }

        if kernel_size == 1 {
            dst.copy_from_slice(src);
            return Ok(());
        }

        let PixelLayout {
            width,
            height,
            channels,
        } = layout;
        let row_stride = width * channels;
        let half = (kernel_size / 2) as usize;

        // Horizontal pass: src → temp
        for y in 0..height {
            for c in 0..channels {
                let line = Line {
                    start: y * row_stride + c,
                    len: width,
                    stride: channels,
                };
                box_line(src, temp, line, half, kernel_size);
            }
        }

        // Vertical pass: temp → dst
        for x in 0..width {
            for c in 0..channels {
                let line = Line {
                    start: x * channels + c,
                    len: height,
                    stride: row_stride,
                };
                box_line(temp, dst, line, half, kernel_size);
            }
        }

        Ok(())
    }
}

/// Samples `start, start + stride, ...` of a buffer, `len` of them.
#[derive(Clone, Copy)]
struct Line {
    start: usize,
    len: usize,
    stride: usize,
}

fn box_line(src: &[u8], dst: &mut [u8], line: Line, half: usize, kernel_size: u32) {
    let at = |i: usize| src[line.start + i * line.stride] as u64;
    let last = line.len - 1;
    let k = kernel_size as u64;

    // Window centred on sample 0: `half` copies of the left edge, then
    // samples 0..=half with the right edge repeated past the end.
    let upto = half.min(last);
    let mut sum = half as u64 * at(0)
        + (0..=upto).map(at).sum::<u64>()
        + (half - upto) as u64 * at(last);

    for x in 0..line.len {
        dst[line.start + x * line.stride] = ((sum + k / 2) / k) as u8;
        let incoming = x.saturating_add(half).saturating_add(1).min(last);
        let outgoing = x.saturating_sub(half);
        sum = sum + at(incoming) - at(outgoing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn layout(width: usize, height: usize, channels: usize) -> PixelLayout {
        PixelLayout {
            width,
            height,
            channels,
        }
    }

    fn run(src: &[u8], l: PixelLayout, kernel_size: u32) -> Vec<u8> {
        let mut dst = vec![0u8; l.byte_len().unwrap()];
        let mut temp = vec![0u8; l.byte_len().unwrap()];
        CpuBoxConvolver::new()
            .convolve(src, &mut dst, &mut temp, l, kernel_size)
            .unwrap();
        dst
    }

    #[test]
    fn test_uniform_image_unchanged() {
        let src = vec![128u8; 10 * 10 * 4];
        let out = run(&src, layout(10, 10, 4), 5);
        assert_eq!(out, src);
    }

    #[test]
    fn test_kernel_size_1_is_identity() {
        let src: Vec<u8> = (0..75).map(|v| (v * 3) as u8).collect();
        let out = run(&src, layout(5, 5, 3), 1);
        assert_eq!(out, src);
    }

    #[test]
    fn test_single_row_averages_neighbours() {
        // 1x5 gray, kernel 3, edges extended
        let src = [0u8, 0, 90, 0, 0];
        let out = run(&src, layout(5, 1, 1), 3);
        assert_eq!(out, vec![0, 30, 30, 30, 0]);
    }

    #[test]
    fn test_edges_are_extended() {
        // Left edge sees [10, 10, 40] -> 20, right edge sees [70, 100, 100] -> 90
        let src = [10u8, 40, 70, 100];
        let out = run(&src, layout(4, 1, 1), 3);
        assert_eq!(out, vec![20, 40, 70, 90]);
    }

    #[test]
    fn test_rounds_half_up() {
        // (0 + 0 + 1) / 3 = 0.33 -> 0 ; (1 + 1 + 0) / 3 = 0.67 -> 1
        let src = [0u8, 0, 1, 1];
        let out = run(&src, layout(4, 1, 1), 3);
        assert_eq!(out, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_spreads_bright_pixel_in_both_directions() {
        let mut src = vec![0u8; 9 * 9];
        src[4 * 9 + 4] = 255;
        let out = run(&src, layout(9, 9, 1), 3);
        assert!(out[4 * 9 + 4] < 255);
        assert!(out[3 * 9 + 4] > 0, "vertical spread");
        assert!(out[4 * 9 + 3] > 0, "horizontal spread");
        assert_eq!(out[0], 0, "far corner untouched");
    }

    #[test]
    fn test_channels_are_independent() {
        // 3x1 RGBA: only the green channel has signal
        let src = [0u8, 90, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
        let out = run(&src, layout(3, 1, 4), 3);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 60); // [90, 90, 0] / 3
        assert_eq!(out[5], 30); // [90, 0, 0] / 3
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_kernel_wider_than_image() {
        let src = [0u8, 255];
        let out = run(&src, layout(2, 1, 1), 101);
        // Window of 101 samples: 50 + 1 zeros vs 50 bright on the left pixel
        assert_eq!(out[0], ((50 * 255 + 50) / 101) as u8);
        assert_eq!(out[1], ((51 * 255 + 50) / 101) as u8);
    }

    #[test]
    fn test_linear_ramp_keeps_mean_and_interior() {
        let src: Vec<u8> = (0..26).map(|v| (v * 10) as u8).collect();
        let out = run(&src, layout(26, 1, 1), 5);
        let mean = |px: &[u8]| px.iter().map(|&v| f64::from(v)).sum::<f64>() / px.len() as f64;
        assert_abs_diff_eq!(mean(&out), mean(&src), epsilon = 0.5);
        assert_eq!(&out[2..24], &src[2..24]);
    }

    #[test]
    fn test_deterministic() {
        let src: Vec<u8> = (0..(16 * 8 * 4)).map(|v| (v * 37 % 251) as u8).collect();
        let a = run(&src, layout(16, 8, 4), 7);
        let b = run(&src, layout(16, 8, 4), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_even_kernel_rejected() {
        let l = layout(2, 2, 1);
        let mut dst = vec![0u8; 4];
        let mut temp = vec![0u8; 4];
        let err = CpuBoxConvolver::new()
            .convolve(&[0; 4], &mut dst, &mut temp, l, 4)
            .unwrap_err();
        assert_eq!(err, ProcessingError::InvalidKernelSize(4));
    }

    #[test]
    fn test_short_temp_rejected() {
        let l = layout(2, 2, 1);
        let mut dst = vec![0u8; 4];
        let mut temp = vec![0u8; 3];
        let err = CpuBoxConvolver::new()
            .convolve(&[0; 4], &mut dst, &mut temp, l, 3)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::BufferSizeMismatch { .. }));
    }

    #[test]
    fn test_overflowing_layout_rejected() {
        let err = CpuBoxConvolver::new()
            .convolve(&[0; 4], &mut [0; 4], &mut [0; 4], layout(usize::MAX, 2, 4), 3)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::LayoutOverflow { .. }));
    }

    #[test]
    fn test_empty_layout_rejected() {
        let err = CpuBoxConvolver::new()
            .convolve(&[], &mut [], &mut [], layout(0, 5, 4), 3)
            .unwrap_err();
        assert_eq!(err, ProcessingError::EmptyImage);
    }
}
