use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flushes buffered log lines when dropped. Must outlive the last log call.
pub struct LogGuards {
    _file: WorkerGuard,
    _console: WorkerGuard,
}

/// `<cache dir>/vidshot/logs`, or the temp dir when there is no cache dir.
pub fn default_log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vidshot")
        .join("logs")
}

pub fn init_logging(log_dir: &Path, service_name: &str) -> Result<LogGuards, anyhow::Error> {
    let _ = rotate_logs_on_startup(log_dir, service_name);
    std::fs::create_dir_all(log_dir)?;

    // One file per run; the previous run's file was just rotated aside
    let file_appender = rolling::never(log_dir, format!("{service_name}.log"));
    let (non_blocking_file, file_guard) = non_blocking(file_appender);

    // Console output goes to stderr so stdout stays clean
    let (non_blocking_console, console_guard) = non_blocking(std::io::stderr());

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(non_blocking_console)
        .with_ansi(true)
        .with_target(false)
        .with_line_number(false);

    // RUST_LOG overrides the default level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    info!(
        "Logging initialized - logs will be written to {}/{service_name}.log",
        log_dir.display()
    );

    Ok(LogGuards {
        _file: file_guard,
        _console: console_guard,
    })
}

pub fn rotate_logs_on_startup(log_dir: &Path, service_name: &str) -> Result<(), anyhow::Error> {
    let log_path = log_dir.join(format!("{service_name}.log"));

    if log_path.exists() {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = log_dir.join(format!("{service_name}.{timestamp}.log"));

        std::fs::rename(&log_path, &backup_path)?;
        info!("Previous log file backed up to: {}", backup_path.display());
    }

    Ok(())
}
