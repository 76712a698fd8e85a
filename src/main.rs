mod config;
mod error;
mod markup;
mod media;
mod pipeline;
mod sampler;
mod scratch;
mod shared;
mod sink;
mod upload;

use clap::Parser;
use config::Config;
use error::{AppError, Result};
use media::Ffmpeg;
use pipeline::Pipeline;
use scratch::ScratchDir;
use shared::logging::{default_log_dir, init_logging};
use sink::{DesktopNotifier, Notification, Notifier, SystemClipboard};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use upload::SmmsClient;

#[derive(Parser, Debug)]
#[command(name = "vidshot")]
#[command(version, about = "Screenshot a video, upload the shots to sm.ms and copy BBCode to the clipboard", long_about = None)]
struct Cli {
    /// Video file to take screenshots from
    #[arg(value_name = "VIDEO")]
    video: PathBuf,

    /// Config file (defaults to config.yaml next to the executable)
    #[arg(short, long, env = "VIDSHOT_CONFIG")]
    config: Option<PathBuf>,

    /// Number of screenshots, overrides the config file
    #[arg(short = 'n', long, env = "VIDSHOT_SHOTS")]
    shots: Option<usize>,

    /// JPEG quality passed to ffmpeg (2-31, lower is better)
    #[arg(short, long, env = "VIDSHOT_QUALITY")]
    quality: Option<u32>,

    /// Directory for log files
    #[arg(long, env = "VIDSHOT_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let parsed = Cli::try_parse();

    let log_dir = parsed
        .as_ref()
        .ok()
        .and_then(|cli| cli.log_dir.clone())
        .unwrap_or_else(default_log_dir);
    let _log_guards = match init_logging(&log_dir, "vidshot") {
        Ok(guards) => Some(guards),
        Err(e) => {
            eprintln!("Warning: failed to initialize logging: {}", e);
            None
        }
    };

    let cli = match parsed {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return fail(
                &DesktopNotifier,
                AppError::Usage("Expected to have a video file as input".to_string()),
            );
        }
    };

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&DesktopNotifier, e),
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config_path = cli.config.unwrap_or_else(config::default_path);
    let config = Config::load(&config_path)?.with_overrides(cli.shots, cli.quality)?;
    info!("Video: {}", cli.video.display());

    let mut pipeline = Pipeline::new(
        config.clone(),
        Box::new(Ffmpeg::new(&config.ffmpeg, &config.ffprobe)),
        Box::new(SmmsClient::new(&config)?),
        Box::new(SystemClipboard),
        Box::new(DesktopNotifier),
    );

    let scratch = ScratchDir::create(&std::env::temp_dir())?;
    if let Err(e) = scratch.remove_on_interrupt() {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut rng = rand::thread_rng();
    pipeline.run(&cli.video, scratch, &mut rng).await
}

/// Report a fatal error. The scratch directory is already gone by the time this runs.
fn fail(notifier: &dyn Notifier, err: AppError) -> ExitCode {
    let message = err.to_string();
    error!("{}", message);
    eprintln!("Error: {}", message);
    notifier.notify(&Notification::failure(&message));
    ExitCode::from(1)
}
