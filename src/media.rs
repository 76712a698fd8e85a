//! ffprobe/ffmpeg wrappers used to measure a video and grab stills from it.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error};

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Total duration of the video in seconds.
    async fn probe_duration(&self, video: &Path) -> Result<f64>;

    /// Decode the frame at `timestamp` seconds into a JPEG at `output`, overwriting it.
    async fn extract_frame(
        &self,
        video: &Path,
        timestamp: u64,
        output: &Path,
        quality: u32,
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse the JSON printed by `ffprobe -show_format -of json`.
pub fn parse_probe_output(stdout: &[u8]) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| AppError::Probe(format!("unreadable ffprobe output: {}", e)))?;

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| AppError::Probe("ffprobe reported no duration".to_string()))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|e| AppError::Probe(format!("invalid duration '{}': {}", raw, e)))
}

pub struct Ffmpeg {
    ffmpeg: String,
    ffprobe: String,
}

impl Ffmpeg {
    pub fn new(ffmpeg: &str, ffprobe: &str) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
        }
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn probe_duration(&self, video: &Path) -> Result<f64> {
        debug!("Probing duration of {}", video.display());

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_format", "-of", "json"])
            .arg(video)
            .output()
            .await
            .map_err(|e| AppError::Probe(format!("failed to run {}: {}", self.ffprobe, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("ffprobe failed ({}): {}", output.status, stderr);
            return Err(AppError::Probe(if stderr.is_empty() {
                format!("ffprobe exited with {}", output.status)
            } else {
                stderr
            }));
        }

        parse_probe_output(&output.stdout)
    }

    async fn extract_frame(
        &self,
        video: &Path,
        timestamp: u64,
        output: &Path,
        quality: u32,
    ) -> Result<()> {
        debug!(
            "Extracting frame at {}s from {} to {}",
            timestamp,
            video.display(),
            output.display()
        );

        let result = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-ss")
            .arg(timestamp.to_string())
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1"])
            .arg("-q:v")
            .arg(quality.to_string())
            .arg(output)
            .output()
            .await
            .map_err(|e| AppError::Extraction {
                timestamp,
                message: format!("failed to run {}: {}", self.ffmpeg, e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!("ffmpeg failed at {}s ({}): {}", timestamp, result.status, stderr);
            return Err(AppError::Extraction {
                timestamp,
                message: if stderr.is_empty() {
                    format!("ffmpeg exited with {}", result.status)
                } else {
                    stderr
                },
            });
        }

        Ok(())
    }
}
