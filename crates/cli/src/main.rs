use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;

use blurkit_core::dispatch::infrastructure::event_loop::EventLoop;
use blurkit_core::imaging::image_file_reader::{is_image_path, ImageFileReader};
use blurkit_core::imaging::image_file_writer::ImageFileWriter;
use blurkit_core::processor::async_request::AsyncBlurRequest;
use blurkit_core::processor::blur_image_processor::BlurImageProcessor;
use blurkit_core::shared::image::Image;

const ASYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Iterated box blur for image files.
#[derive(Parser)]
#[command(name = "blurkit")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output image file.
    output: PathBuf,

    /// Box radius in pixels (even values are rounded up to odd, 0 disables).
    #[arg(long, default_value = "9")]
    radius: u32,

    /// Number of box passes (3 approximates a Gaussian, 0 disables).
    #[arg(long, default_value = "3")]
    iterations: u8,

    /// Blur on the processor's queue instead of the calling thread.
    #[arg(long = "async")]
    run_async: bool,

    /// Async mode: queue this many progressively stronger blurs.
    #[arg(long, default_value = "1")]
    steps: u32,

    /// Async mode: each new step cancels the previous one if it has not started.
    #[arg(long)]
    cancel_last: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let source = Arc::new(ImageFileReader::new().read(&cli.input)?);
    log::info!(
        "Loaded {}x{} image from {}",
        source.width(),
        source.height(),
        cli.input.display()
    );
    let processor = BlurImageProcessor::new(source)?;

    let started = Instant::now();
    let blurred = if cli.run_async {
        run_async_blur(&processor, &cli)?
    } else {
        processor.sync_blur(cli.radius, cli.iterations)?
    };
    log::info!("Blurred in {:.1?}", started.elapsed());

    write_output(&cli.output, &blurred)
}

fn run_async_blur(
    processor: &BlurImageProcessor,
    cli: &Cli,
) -> Result<Arc<Image>, Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new();
    let latest: Arc<Mutex<Option<Arc<Image>>>> = Arc::new(Mutex::new(None));
    let failure: Arc<Mutex<Option<i64>>> = Arc::new(Mutex::new(None));

    for step in 1..=cli.steps {
        let radius = step_radius(cli.radius, step, cli.steps);
        let on_latest = latest.clone();
        let on_failure = failure.clone();
        let request = AsyncBlurRequest::new(radius, cli.iterations, event_loop.context())
            .cancel_last_operation(cli.cancel_last)
            .on_success(move |image| {
                log::info!("Step {step}: radius {radius} delivered {}", image.id());
                if let Ok(mut slot) = on_latest.lock() {
                    *slot = Some(image);
                }
            })
            .on_error(move |code| {
                log::warn!("Step {step}: radius {radius} failed with code {code}");
                if let Ok(mut slot) = on_failure.lock() {
                    *slot = Some(code);
                }
            });
        processor.async_blur(request)?;
    }

    if !processor.wait_until_idle(ASYNC_TIMEOUT) {
        return Err("Timed out waiting for queued blurs".into());
    }
    let delivered = event_loop.run_pending();
    log::info!("{delivered} of {} steps delivered", cli.steps);

    let image = latest.lock().map_err(|_| "result slot poisoned")?.take();
    match image {
        Some(image) => Ok(image),
        None => {
            let code = failure.lock().map_err(|_| "result slot poisoned")?.take();
            Err(format!("No blur step succeeded (last error code {code:?})").into())
        }
    }
}

fn write_output(output: &Path, image: &Image) -> Result<(), Box<dyn std::error::Error>> {
    ImageFileWriter::new().write(output, image)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

/// Radius for `step` of `steps`, growing linearly up to `radius`.
fn step_radius(radius: u32, step: u32, steps: u32) -> u32 {
    let scaled = u64::from(radius) * u64::from(step) / u64::from(steps);
    (scaled as u32).max(1).min(radius)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_image_path(&cli.input) {
        return Err(format!("Unsupported input format: {}", cli.input.display()).into());
    }
    if !is_image_path(&cli.output) {
        return Err(format!("Unsupported output format: {}", cli.output.display()).into());
    }
    if cli.steps == 0 {
        return Err("Steps must be at least 1".into());
    }
    if !cli.run_async && (cli.steps > 1 || cli.cancel_last) {
        return Err("--steps and --cancel-last require --async".into());
    }
    Ok(())
}
