use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-run working directory for screenshots. Removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path) -> Result<Self> {
        let path = root.join(format!("vidshot-{}", Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        debug!("Created scratch directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn screenshot_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("temp_screenshot_{index}.jpg"))
    }

    /// Remove the directory and exit with status 1 on Ctrl-C.
    ///
    /// Can only be installed once per process.
    pub fn remove_on_interrupt(&self) -> std::result::Result<(), ctrlc::Error> {
        let path = self.path.clone();
        ctrlc::set_handler(move || {
            info!("Interrupted, removing {}", path.display());
            let _ = fs::remove_dir_all(&path);
            std::process::exit(1);
        })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed scratch directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
