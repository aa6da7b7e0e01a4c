use std::sync::Arc;
use std::time::Instant;

use crate::blurring::domain::blur_params::BlurParams;
use crate::blurring::domain::box_convolver::BoxConvolver;
use crate::blurring::domain::processing_error::ProcessingError;
use crate::shared::image::{Image, PixelLayout};

use super::scratch_buffers::{ScratchBuffers, ScratchStore};

const MAX_CHANNELS: usize = 4;

/// Applies `iterations` box passes of width `radius` to a source image.
///
/// Repeated box passes approximate a Gaussian blur. The source is never
/// touched; every successful run returns a newly allocated image with the
/// same dimensions and channel count.
pub struct KernelRunner {
    convolver: Arc<dyn BoxConvolver>,
}

impl KernelRunner {
    pub fn new(convolver: Arc<dyn BoxConvolver>) -> Self {
        Self { convolver }
    }

    pub fn run(
        &self,
        source: &Image,
        params: BlurParams,
        scratch: &ScratchStore,
    ) -> Result<Image, ProcessingError> {
        let params = params.normalized();
        let (layout, len) = validate(source)?;
        let mut output = allocate(len)?;

        if params.is_passthrough() {
            output.copy_from_slice(source.data());
            return Ok(Image::new(
                output,
                source.width(),
                source.height(),
                source.channels(),
            ));
        }

        let started = Instant::now();
        let mut checked_out = scratch.checkout();
        let result = self.convolve_passes(
            source.data(),
            &mut output,
            &mut checked_out.buffers,
            layout,
            len,
            params,
        );
        scratch.checkin(checked_out);
        result?;

        log::debug!(
            "Box blur {}x{} radius={} iterations={} took {:.1}ms",
            layout.width,
            layout.height,
            params.radius,
            params.iterations,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Image::new(
            output,
            source.width(),
            source.height(),
            source.channels(),
        ))
    }

    fn convolve_passes(
        &self,
        src: &[u8],
        output: &mut [u8],
        buffers: &mut ScratchBuffers,
        layout: PixelLayout,
        len: usize,
        params: BlurParams,
    ) -> Result<(), ProcessingError> {
        let passes = params.iterations as usize;
        let ping_len = if passes > 1 { len } else { 0 };
        buffers.ensure(ping_len, self.convolver.temp_buffer_len(layout))?;

        let ScratchBuffers { ping, temp } = buffers;
        let ping = &mut ping[..ping_len];
        let kernel = params.radius;

        // Passes alternate between `output` and `ping`; the first target is
        // chosen so the final pass lands in `output`.
        let mut in_output = passes % 2 == 1;
        if in_output {
            self.convolver.convolve(src, output, temp, layout, kernel)?;
        } else {
            self.convolver.convolve(src, ping, temp, layout, kernel)?;
        }
        for _ in 1..passes {
            if in_output {
                self.convolver.convolve(output, ping, temp, layout, kernel)?;
            } else {
                self.convolver.convolve(ping, output, temp, layout, kernel)?;
            }
            in_output = !in_output;
        }
        debug_assert!(in_output);
        Ok(())
    }
}

/// Checks the source against its declared layout and returns the layout
/// with its byte length.
fn validate(source: &Image) -> Result<(PixelLayout, usize), ProcessingError> {
    let layout = source.layout();
    if layout.channels == 0 || layout.channels > MAX_CHANNELS {
        return Err(ProcessingError::UnsupportedFormat {
            channels: layout.channels,
        });
    }
    let len = layout
        .byte_len()
        .ok_or_else(|| ProcessingError::layout_overflow(layout))?;
    if len == 0 || source.data().is_empty() {
        return Err(ProcessingError::EmptyImage);
    }
    if source.data().len() != len {
        return Err(ProcessingError::BufferSizeMismatch {
            expected: len,
            actual: source.data().len(),
        });
    }
    Ok((layout, len))
}

fn allocate(len: usize) -> Result<Vec<u8>, ProcessingError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ProcessingError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::infrastructure::cpu_box_convolver::CpuBoxConvolver;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConvolver {
        calls: AtomicUsize,
        inner: CpuBoxConvolver,
    }

    impl BoxConvolver for CountingConvolver {
        fn convolve(
            &self,
            src: &[u8],
            dst: &mut [u8],
            temp: &mut [u8],
            layout: PixelLayout,
            kernel_size: u32,
        ) -> Result<(), ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.convolve(src, dst, temp, layout, kernel_size)
        }
    }

    struct FailingConvolver;

    impl BoxConvolver for FailingConvolver {
        fn convolve(
            &self,
            _src: &[u8],
            _dst: &mut [u8],
            _temp: &mut [u8],
            _layout: PixelLayout,
            _kernel_size: u32,
        ) -> Result<(), ProcessingError> {
            Err(ProcessingError::Primitive { code: -99 })
        }
    }

    fn counting() -> (Arc<CountingConvolver>, KernelRunner) {
        let conv = Arc::new(CountingConvolver {
            calls: AtomicUsize::new(0),
            inner: CpuBoxConvolver::new(),
        });
        let runner = KernelRunner::new(conv.clone());
        (conv, runner)
    }

    fn gradient(width: u32, height: u32) -> Image {
        let data = (0..width * height * 4).map(|v| (v * 7 % 256) as u8).collect();
        Image::new(data, width, height, 4)
    }

    #[rstest]
    #[case::zero_radius(0, 3)]
    #[case::zero_iterations(9, 0)]
    fn test_passthrough_copies_without_convolving(#[case] radius: u32, #[case] iterations: u8) {
        let (conv, runner) = counting();
        let source = gradient(8, 6);
        let out = runner
            .run(&source, BlurParams::new(radius, iterations), &ScratchStore::new())
            .unwrap();
        assert_eq!(out.data(), source.data());
        assert_ne!(out.id(), source.id());
        assert_eq!(conv.calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(6)]
    fn test_one_primitive_call_per_iteration(#[case] iterations: u8) {
        let (conv, runner) = counting();
        runner
            .run(&gradient(8, 8), BlurParams::new(3, iterations), &ScratchStore::new())
            .unwrap();
        assert_eq!(conv.calls.load(Ordering::SeqCst), iterations as usize);
    }

    #[test]
    fn test_output_keeps_dimensions_and_format() {
        let (_, runner) = counting();
        let source = Image::filled(7, 3, 3, 50);
        let out = runner
            .run(&source, BlurParams::new(5, 2), &ScratchStore::new())
            .unwrap();
        assert_eq!((out.width(), out.height(), out.channels()), (7, 3, 3));
        assert_eq!(out.data().len(), source.data().len());
    }

    #[test]
    fn test_iterations_compose_single_passes() {
        let (_, runner) = counting();
        let scratch = ScratchStore::new();
        let source = gradient(10, 10);

        let once = runner.run(&source, BlurParams::new(3, 1), &scratch).unwrap();
        let twice_manual = runner.run(&once, BlurParams::new(3, 1), &scratch).unwrap();
        let twice = runner.run(&source, BlurParams::new(3, 2), &scratch).unwrap();
        let thrice_manual = runner
            .run(&twice_manual, BlurParams::new(3, 1), &scratch)
            .unwrap();
        let thrice = runner.run(&source, BlurParams::new(3, 3), &scratch).unwrap();

        assert_eq!(twice.data(), twice_manual.data());
        assert_eq!(thrice.data(), thrice_manual.data());
    }

    #[test]
    fn test_even_radius_runs_as_next_odd() {
        let (_, runner) = counting();
        let scratch = ScratchStore::new();
        let source = gradient(9, 9);
        let even = runner.run(&source, BlurParams::new(4, 2), &scratch).unwrap();
        let odd = runner.run(&source, BlurParams::new(5, 2), &scratch).unwrap();
        assert_eq!(even.data(), odd.data());
    }

    #[test]
    fn test_deterministic_output() {
        let (_, runner) = counting();
        let source = gradient(16, 12);
        let a = runner
            .run(&source, BlurParams::new(7, 3), &ScratchStore::new())
            .unwrap();
        let b = runner
            .run(&source, BlurParams::new(7, 3), &ScratchStore::new())
            .unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_blur_smooths_contrast() {
        let (_, runner) = counting();
        let mut data = vec![0u8; 20 * 20];
        data[10 * 20 + 10] = 255;
        let source = Image::new(data, 20, 20, 1);
        let out = runner
            .run(&source, BlurParams::new(3, 3), &ScratchStore::new())
            .unwrap();
        let view = out.as_ndarray().unwrap();
        assert!(view[[10, 10, 0]] < 255);
        assert!(view[[9, 10, 0]] > 0);
        assert_eq!(source.data()[10 * 20 + 10], 255, "source untouched");
    }

    #[test]
    fn test_scratch_retained_after_run() {
        let (_, runner) = counting();
        let scratch = ScratchStore::new();
        runner
            .run(&gradient(8, 8), BlurParams::new(3, 2), &scratch)
            .unwrap();
        assert!(scratch.allocated_bytes() >= 2 * 8 * 8 * 4);
    }

    #[rstest]
    #[case::no_channels(Image::new(vec![], 4, 4, 0), ProcessingError::UnsupportedFormat { channels: 0 })]
    #[case::too_many_channels(Image::filled(2, 2, 5, 0), ProcessingError::UnsupportedFormat { channels: 5 })]
    #[case::zero_bytes(Image::new(vec![], 0, 0, 4), ProcessingError::EmptyImage)]
    #[case::unaddressable(
        Image::new(vec![0; 16], u32::MAX, u32::MAX, 4),
        ProcessingError::LayoutOverflow {
            width: u32::MAX as usize,
            height: u32::MAX as usize,
            channels: 4,
        }
    )]
    #[case::short_buffer(Image::new(vec![0; 10], 2, 2, 3), ProcessingError::BufferSizeMismatch { expected: 12, actual: 10 })]
    fn test_invalid_sources_rejected(#[case] source: Image, #[case] expected: ProcessingError) {
        let (conv, runner) = counting();
        let err = runner
            .run(&source, BlurParams::new(3, 1), &ScratchStore::new())
            .unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(conv.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_primitive_failure_propagates_code() {
        let runner = KernelRunner::new(Arc::new(FailingConvolver));
        let scratch = ScratchStore::new();
        let err = runner
            .run(&gradient(4, 4), BlurParams::new(3, 2), &scratch)
            .unwrap_err();
        assert_eq!(err.code(), -99);
        assert!(scratch.allocated_bytes() > 0, "scratch returned after failure");
    }
}
