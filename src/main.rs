use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{error::ErrorKind, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use region_fx::{
    config::Config,
    region::CornerPair,
    save::SaveRunner,
    session::Session,
    transform::TransformMode,
    ui,
    video,
    RegionFxError,
};

#[derive(Parser)]
#[command(
    name = "region-fx",
    version,
    about = "Crop or pixelate a rectangular region of a video over a time window",
    long_about = "region-fx shows one frame of the input video, lets you drag a rectangle over it, and writes a new video in which that region is either cropped out or pixelated for the chosen duration. Saves always write the configured output file (output.mov by default), replacing any previous output."
)]
struct Cli {
    /// Input video file
    input: PathBuf,

    /// Time of the preview frame in seconds; saves start here
    #[arg(short, long, default_value_t = 0.0)]
    start: f64,

    /// Duration of the transform window in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Transform to apply (crop, mosaic)
    #[arg(short, long, value_enum, default_value_t = TransformMode::Crop)]
    mode: TransformMode,

    /// Run without a window using this rectangle: X0,Y0,X1,Y1
    #[arg(long)]
    rect: Option<CornerPair>,

    /// Output video path (overrides the configuration file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting region-fx v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", cli.input);
    info!("Mode: {}", cli.mode);

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(fatal)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    config.validate().map_err(fatal)?;
    info!("Output: {:?}", config.output.path);

    video::ensure_tools(&config.tools).map_err(fatal)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let mut session = Session::open(config, &cli.input, cli.start).map_err(fatal)?;
    if let Some(duration) = cli.duration {
        session.duration_input = duration.to_string();
    }

    let runner = SaveRunner::new(runtime.handle().clone());
    let outcome = match cli.rect {
        Some(corners) => run_headless(&runtime, runner, session, corners, cli.mode),
        None => ui::run(session, runner, cli.mode).map_err(fatal),
    };

    // Give a cancelled worker time to remove its partial output
    runtime.shutdown_timeout(Duration::from_secs(10));
    outcome
}

fn run_headless(
    runtime: &tokio::runtime::Runtime,
    mut runner: SaveRunner,
    mut session: Session,
    corners: CornerPair,
    mode: TransformMode,
) -> Result<()> {
    if session.duration_input.is_empty() {
        return Err(anyhow!("--duration is required together with --rect"));
    }

    session.press(corners.a);
    session.release(Some(corners.b));

    let request = session.build_request(mode).map_err(fatal)?;
    info!("Region: {}", request.region);
    runner.start(request).map_err(fatal)?;

    let result = runtime.block_on(runner.wait(|progress| {
        if progress.frames_written % 30 == 0 || progress.frames_written == progress.frames_requested {
            info!("Progress: {}/{} frames", progress.frames_written, progress.frames_requested);
        }
    }));

    match result {
        Some(Ok(report)) => {
            info!("Output saved to {:?}", report.output);
            Ok(())
        }
        Some(Err(e)) => Err(fatal(e)),
        None => Err(anyhow!("no save was running")),
    }
}

fn fatal(err: RegionFxError) -> anyhow::Error {
    error!("{}", err);
    anyhow!(err.user_message())
}
