use crate::error::{AppError, Result};
use std::time::Duration;
use tracing::{debug, warn};

pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub duration: Duration,
    pub urgency: Urgency,
}

impl Notification {
    pub fn success(body: &str) -> Self {
        Self {
            title: "BBCode copied to clipboard".to_string(),
            body: body.to_string(),
            duration: NOTIFICATION_DURATION,
            urgency: Urgency::Normal,
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            title: "Script failed with error!".to_string(),
            body: error.to_string(),
            duration: NOTIFICATION_DURATION,
            urgency: Urgency::Critical,
        }
    }
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Fire-and-forget: delivery problems are logged, never escalated.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| AppError::Clipboard(e.to_string()))?;
        debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }
}

pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) {
        let mut toast = notify_rust::Notification::new();
        toast
            .summary(&notification.title)
            .body(&notification.body)
            .timeout(notify_rust::Timeout::Milliseconds(
                notification.duration.as_millis() as u32,
            ));

        #[cfg(all(unix, not(target_os = "macos")))]
        toast.urgency(match notification.urgency {
            Urgency::Normal => notify_rust::Urgency::Normal,
            Urgency::Critical => notify_rust::Urgency::Critical,
        });

        if let Err(e) = toast.show() {
            warn!("Failed to send notification '{}': {}", notification.title, e);
        }
    }
}
