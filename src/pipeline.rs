use crate::config::Config;
use crate::error::{AppError, Result};
use crate::markup;
use crate::media::MediaTool;
use crate::sampler::sample_timestamps;
use crate::scratch::ScratchDir;
use crate::sink::{Clipboard, Notification, Notifier};
use crate::upload::ImageHost;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct Pipeline {
    config: Config,
    media: Box<dyn MediaTool>,
    host: Box<dyn ImageHost>,
    clipboard: Box<dyn Clipboard>,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        media: Box<dyn MediaTool>,
        host: Box<dyn ImageHost>,
        clipboard: Box<dyn Clipboard>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            media,
            host,
            clipboard,
            notifier,
        }
    }

    /// Screenshot, upload and copy. Returns the BBCode block placed on the clipboard.
    ///
    /// `scratch` is consumed so it is removed however the run ends.
    pub async fn run<R: Rng>(
        &mut self,
        video: &Path,
        scratch: ScratchDir,
        rng: &mut R,
    ) -> Result<String> {
        let duration = self.media.probe_duration(video).await?;
        info!("Video duration: {:.2}s", duration);

        let timestamps = sample_timestamps(duration, self.config.shots, rng)?;
        info!("Screenshot timestamps: {:?}", timestamps);
        info!("Scratch directory: {}", scratch.path().display());

        let screenshots = self.take_screenshots(video, &timestamps, &scratch).await?;
        let urls = self.upload_all(&screenshots).await?;

        let lines: Vec<String> = urls.iter().map(|url| markup::bbcode(url)).collect();
        let text = markup::join_lines(&lines);

        self.clipboard.set_text(&text)?;
        info!("Success! BBCode copied to clipboard");
        self.notifier.notify(&Notification::success(&text));

        Ok(text)
    }

    async fn take_screenshots(
        &self,
        video: &Path,
        timestamps: &[u64],
        scratch: &ScratchDir,
    ) -> Result<Vec<PathBuf>> {
        info!("Taking screenshots");
        let total = timestamps.len();
        let mut paths = Vec::with_capacity(total);

        for (index, &timestamp) in timestamps.iter().enumerate() {
            let path = scratch.screenshot_path(index);
            self.media
                .extract_frame(video, timestamp, &path, self.config.quality)
                .await?;

            if !path.exists() {
                return Err(AppError::ScreenshotMissing(path));
            }

            info!("[{}/{}] Captured frame at {}s", index + 1, total, timestamp);
            paths.push(path);
        }

        Ok(paths)
    }

    async fn upload_all(&self, screenshots: &[PathBuf]) -> Result<Vec<String>> {
        info!("Uploading to {}", self.config.api_url);
        let total = screenshots.len();
        let mut urls = Vec::with_capacity(total);

        for (index, path) in screenshots.iter().enumerate() {
            let url = self.host.upload(path).await?;
            info!("[{}/{}] Uploaded {}", index + 1, total, url);
            urls.push(url);
        }

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Urgency;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        extracted: Mutex<Vec<(u64, PathBuf)>>,
        uploaded: Mutex<Vec<PathBuf>>,
        clipboard: Mutex<Option<String>>,
        notifications: Mutex<Vec<Notification>>,
    }

    struct MockMedia {
        duration: Option<f64>,
        fail_at: Option<usize>,
        write_files: bool,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl MediaTool for MockMedia {
        async fn probe_duration(&self, _video: &Path) -> Result<f64> {
            self.duration
                .ok_or_else(|| AppError::Probe("Invalid data found when processing input".to_string()))
        }

        async fn extract_frame(
            &self,
            _video: &Path,
            timestamp: u64,
            output: &Path,
            quality: u32,
        ) -> Result<()> {
            assert_eq!(quality, 5);
            let mut extracted = self.calls.extracted.lock().unwrap();
            if self.fail_at == Some(extracted.len()) {
                return Err(AppError::Extraction {
                    timestamp,
                    message: "decode error".to_string(),
                });
            }
            extracted.push((timestamp, output.to_path_buf()));
            if self.write_files {
                fs::write(output, b"\xff\xd8\xff").unwrap();
            }
            Ok(())
        }
    }

    struct MockHost {
        url: String,
        fail_at: Option<usize>,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl ImageHost for MockHost {
        async fn upload(&self, path: &Path) -> Result<String> {
            assert!(path.exists(), "uploaded file must still exist");
            let mut uploaded = self.calls.uploaded.lock().unwrap();
            if self.fail_at == Some(uploaded.len()) {
                return Err(AppError::Upload("Unauthorized.".to_string()));
            }
            uploaded.push(path.to_path_buf());
            Ok(self.url.clone())
        }
    }

    struct MockClipboard(Arc<Calls>);

    impl Clipboard for MockClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            *self.0.clipboard.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct MockNotifier(Arc<Calls>);

    impl Notifier for MockNotifier {
        fn notify(&self, notification: &Notification) {
            self.0.notifications.lock().unwrap().push(notification.clone());
        }
    }

    struct Harness {
        duration: Option<f64>,
        extract_fail_at: Option<usize>,
        write_files: bool,
        upload_fail_at: Option<usize>,
        shots: usize,
    }

    impl Default for Harness {
        fn default() -> Self {
            Self {
                duration: Some(100.0),
                extract_fail_at: None,
                write_files: true,
                upload_fail_at: None,
                shots: 3,
            }
        }
    }

    impl Harness {
        async fn run(self, root: &Path) -> (Result<String>, Arc<Calls>) {
            let calls = Arc::new(Calls::default());
            let config = Config::from_yaml("sm_token: secret\n")
                .unwrap()
                .with_overrides(Some(self.shots), None)
                .unwrap();

            let mut pipeline = Pipeline::new(
                config,
                Box::new(MockMedia {
                    duration: self.duration,
                    fail_at: self.extract_fail_at,
                    write_files: self.write_files,
                    calls: calls.clone(),
                }),
                Box::new(MockHost {
                    url: "https://i.host/a.jpg".to_string(),
                    fail_at: self.upload_fail_at,
                    calls: calls.clone(),
                }),
                Box::new(MockClipboard(calls.clone())),
                Box::new(MockNotifier(calls.clone())),
            );

            let scratch = ScratchDir::create(root).unwrap();
            let mut rng = StdRng::seed_from_u64(3);
            let result = pipeline.run(Path::new("movie.mkv"), scratch, &mut rng).await;
            (result, calls)
        }
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let root = tempfile::tempdir().unwrap();
        let (result, calls) = Harness::default().run(root.path()).await;

        let expected = vec!["[img]https://i.host/a.jpg[/img]"; 3].join("\n");
        assert_eq!(result.unwrap(), expected);
        assert_eq!(calls.clipboard.lock().unwrap().as_deref(), Some(expected.as_str()));

        let extracted = calls.extracted.lock().unwrap();
        assert_eq!(extracted.len(), 3);
        assert!(extracted.iter().all(|(t, _)| (20..80).contains(t)));
        assert!(extracted[1].1.ends_with("temp_screenshot_1.jpg"));
        assert_eq!(calls.uploaded.lock().unwrap().len(), 3);

        let notifications = calls.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].urgency, Urgency::Normal);
        assert_eq!(notifications[0].body, expected);

        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn test_counts_follow_shot_count() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            shots: 5,
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        assert_eq!(result.unwrap().lines().count(), 5);
        assert_eq!(calls.extracted.lock().unwrap().len(), 5);
        assert_eq!(calls.uploaded.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_probe_failure_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            duration: None,
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        assert!(matches!(result, Err(AppError::Probe(_))));
        assert!(calls.extracted.lock().unwrap().is_empty());
        assert!(calls.clipboard.lock().unwrap().is_none());
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn test_short_video_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            duration: Some(1.0),
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        assert!(matches!(result, Err(AppError::VideoTooShort(_))));
        assert!(calls.extracted.lock().unwrap().is_empty());
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn test_extraction_failure_stops_the_run() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            extract_fail_at: Some(1),
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        assert!(matches!(result, Err(AppError::Extraction { .. })));
        assert_eq!(calls.extracted.lock().unwrap().len(), 1);
        assert!(calls.uploaded.lock().unwrap().is_empty());
        assert!(calls.clipboard.lock().unwrap().is_none());
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn test_missing_screenshot_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            write_files: false,
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        match result {
            Err(AppError::ScreenshotMissing(path)) => {
                assert!(path.ends_with("temp_screenshot_0.jpg"))
            }
            other => panic!("expected missing screenshot, got {:?}", other),
        }
        assert!(calls.uploaded.lock().unwrap().is_empty());
        assert!(is_empty_dir(root.path()));
    }

    #[tokio::test]
    async fn test_upload_failure_delivers_nothing() {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness {
            upload_fail_at: Some(2),
            ..Harness::default()
        };
        let (result, calls) = harness.run(root.path()).await;

        assert!(matches!(result, Err(AppError::Upload(_))));
        assert_eq!(calls.uploaded.lock().unwrap().len(), 2);
        assert!(calls.clipboard.lock().unwrap().is_none());
        assert!(calls.notifications.lock().unwrap().is_empty());
        assert!(is_empty_dir(root.path()));
    }
}
