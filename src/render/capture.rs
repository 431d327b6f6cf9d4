use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

use super::collaborators::ImageCapturer;

const WINDOW_SIZE: &str = "1280,1024";

/// Screenshots a page with a headless Chrome or Chromium binary.
pub struct HeadlessBrowserCapturer {
    browser: String,
    results_dir: PathBuf,
    stamp: String,
    settle: Duration,
}

impl HeadlessBrowserCapturer {
    /// `settle` is how long the page may load tiles before the shot is taken.
    pub fn new(browser: &str, results_dir: impl Into<PathBuf>, stamp: &str, settle: Duration) -> Self {
        Self {
            browser: browser.to_string(),
            results_dir: results_dir.into(),
            stamp: stamp.to_string(),
            settle,
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.results_dir.join(format!("image_{}.png", self.stamp))
    }

    pub fn arguments(&self, map: &Path, image: &Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={}", WINDOW_SIZE),
            format!("--virtual-time-budget={}", self.settle.as_millis()),
            format!("--screenshot={}", image.display()),
            format!("file://{}", map.display()),
        ]
    }
}

impl ImageCapturer for HeadlessBrowserCapturer {
    #[tracing::instrument(skip(self), fields(browser = %self.browser))]
    fn capture(&self, map: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.results_dir)?;
        let image = self.image_path();
        let args = self.arguments(map, &image);
        debug!(?args, "Launching headless browser");

        let output = Command::new(&self.browser)
            .args(&args)
            .output()
            .with_context(|| format!("failed to launch {}", self.browser))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.browser,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        info!(path = %image.display(), "Map captured");
        Ok(image)
    }
}
