use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Video too short to sample screenshots ({0:.2}s)")]
    VideoTooShort(f64),

    #[error("Screenshot extraction failed at {timestamp}s: {message}")]
    Extraction { timestamp: u64, message: String },

    #[error("Screenshot failed: {} was not created", .0.display())]
    ScreenshotMissing(PathBuf),

    #[error("Unable to upload image to host: {0}")]
    Upload(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
