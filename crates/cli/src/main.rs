use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use qr_overlay_core::capture::domain::frame_source::FrameSource;
use qr_overlay_core::capture::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use qr_overlay_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use qr_overlay_core::decoding::infrastructure::software_loader::BundledSoftwareLoader;
use qr_overlay_core::presence::infrastructure::console_presenter::ConsolePresenter;
use qr_overlay_core::presence::infrastructure::overlay_catalog::OverlayCatalog;
use qr_overlay_core::scanning::render_ticker::IntervalTicker;
use qr_overlay_core::scanning::scan_session::ScanSession;
use qr_overlay_core::scanning::stop_handle::StopHandle;
use qr_overlay_core::shared::constants::DEFAULT_IMAGE_SEQUENCE_FPS;
use qr_overlay_core::shared::scan_config::{InversionMode, ScanConfig};
use qr_overlay_core::shared::timestamp::{Clock, MonotonicClock};

/// Scan a camera feed for QR codes and report which overlay is on screen.
#[derive(Parser)]
#[command(name = "qr-overlay")]
struct Cli {
    /// Camera device, stream URL, or video file (e.g. /dev/video0).
    source: Option<String>,

    /// Replay an image file or a directory of images instead of a camera.
    #[arg(long, conflicts_with = "source")]
    images: Option<PathBuf>,

    /// Frame rate for --images playback.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SEQUENCE_FPS)]
    fps: f64,

    /// Loop --images playback instead of ending after the last image.
    #[arg(long = "loop")]
    looping: bool,

    /// Scan settings JSON (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra overlay definitions JSON, keyed by identifier.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// How long an overlay survives after its code is lost, in ms.
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Minimum spacing between decode attempts, in ms.
    #[arg(long)]
    min_interval_ms: Option<u64>,

    /// Width frames are downsampled to before software decoding.
    #[arg(long)]
    target_width: Option<u32>,

    /// Render tick rate in Hz.
    #[arg(long)]
    refresh_hz: Option<u32>,

    /// Also look for light-on-dark codes (slower).
    #[arg(long)]
    attempt_inverted: bool,

    /// Decode on the tick thread instead of a background worker.
    #[arg(long)]
    inline_decode: bool,

    /// Stop after this many seconds.
    #[arg(long)]
    max_seconds: Option<f64>,
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

    let config = build_config(&cli)?;
    let catalog = build_catalog(&cli)?;
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let source = open_source(&cli, Arc::clone(&clock))?;
    let presenter = ConsolePresenter::stdout(catalog);

    // No host barcode capability exists on desktop platforms; the bundled
    // decoder is always used.
    let mut session = ScanSession::start(
        &config,
        source,
        None,
        &BundledSoftwareLoader,
        Box::new(presenter),
        StopHandle::new(),
    )?;

    let limit = run_limit(&cli)?;
    let mut ticker = IntervalTicker::new(clock, config.refresh_interval()).with_limit(limit);
    let stats = session.run(&mut ticker);

    eprintln!(
        "Scanned {} frames, {} detections.",
        stats.decode_attempts.saturating_sub(stats.frames_unavailable),
        stats.detections
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::load_or_default()?,
    };
    if let Some(ms) = cli.hold_ms {
        config.hold_duration_ms = ms;
    }
    if let Some(ms) = cli.min_interval_ms {
        config.min_decode_interval_ms = ms;
    }
    if let Some(width) = cli.target_width {
        config.software_target_width = width;
    }
    if let Some(hz) = cli.refresh_hz {
        config.refresh_rate_hz = hz;
    }
    if cli.attempt_inverted {
        config.inversion = InversionMode::AttemptBoth;
    }
    if cli.inline_decode {
        config.background_decode = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_catalog(cli: &Cli) -> Result<OverlayCatalog, Box<dyn std::error::Error>> {
    let mut catalog = OverlayCatalog::builtin();
    if let Some(path) = &cli.catalog {
        catalog.extend_from_json(path)?;
    }
    Ok(catalog)
}

fn open_source(
    cli: &Cli,
    clock: Arc<dyn Clock>,
) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    match (&cli.images, &cli.source) {
        (Some(images), _) => Ok(Box::new(
            ImageSequenceSource::new(images, cli.fps, clock).with_looping(cli.looping),
        )),
        (None, Some(location)) => Ok(Box::new(FfmpegFrameSource::new(location.as_str()))),
        (None, None) => Err("A camera SOURCE or --images is required".into()),
    }
}

fn run_limit(cli: &Cli) -> Result<Option<Duration>, Box<dyn std::error::Error>> {
    match cli.max_seconds {
        Some(seconds) => Duration::try_from_secs_f64(seconds)
            .map(Some)
            .map_err(|e| format!("Invalid --max-seconds {seconds}: {e}").into()),
        None => Ok(None),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.source.is_none() && cli.images.is_none() {
        return Err("A camera SOURCE or --images is required".into());
    }
    if let Some(images) = &cli.images {
        if !images.exists() {
            return Err(format!("Images not found: {}", images.display()).into());
        }
    }
    if !(cli.fps > 0.0 && cli.fps.is_finite()) {
        return Err(format!("FPS must be a positive number, got {}", cli.fps).into());
    }
    if cli.looping && cli.images.is_none() {
        return Err("--loop only applies to --images playback".into());
    }
    if let Some(seconds) = cli.max_seconds {
        if !(seconds > 0.0 && seconds.is_finite()) {
            return Err(format!("Max seconds must be positive, got {seconds}").into());
        }
    }
    run_limit(cli)?;
    Ok(())
}
