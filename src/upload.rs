use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

const UPLOAD_FIELD: &str = "smfile";

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload the image at `path` and return its hosted URL.
    async fn upload(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
}

/// Interpret an sm.ms upload response body.
///
/// When the image was uploaded before, sm.ms answers with `success: false` and
/// a message that contains the existing URL; that URL is returned instead.
pub fn parse_upload_response(body: &str) -> Result<String> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Upload(format!("malformed response: {}", e)))?;

    if response.success {
        return response
            .data
            .and_then(|d| d.url)
            .ok_or_else(|| AppError::Upload("response is missing data.url".to_string()));
    }

    let message = response
        .message
        .unwrap_or_else(|| "upload rejected without a message".to_string());

    if let Some(url) = extract_existing_url(&message) {
        info!("Image already hosted, reusing {}", url);
        return Ok(url);
    }

    Err(AppError::Upload(message))
}

/// First URL embedded in `message`, if it points at a JPEG.
pub fn extract_existing_url(message: &str) -> Option<String> {
    let pattern = Regex::new(r"https?://\S+").ok()?;
    pattern
        .find(message)
        .map(|m| m.as_str())
        .filter(|url| url.ends_with(".jpg"))
        .map(|url| url.to_string())
}

pub struct SmmsClient {
    client: Client,
    api_url: String,
    token: String,
}

impl SmmsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("vidshot/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|e| AppError::Upload(format!("failed to create client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.sm_token.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for SmmsClient {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "screenshot.jpg".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = format!("{}/upload", self.api_url);
        debug!("Uploading {} to {}", path.display(), url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upload(format!("failed to read response: {}", e)))?;
        if !status.is_success() {
            warn!("Image host answered {}", status);
        }

        parse_upload_response(&body)
    }
}
