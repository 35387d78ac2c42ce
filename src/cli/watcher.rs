//! Polls the script file and forwards edits to the preview

use crate::preview::Preview;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Reports the file's text whenever its contents change
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    last: Option<md5::Digest>,
    failing: bool,
}

impl FileWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
            failing: false,
        }
    }

    /// Treat `source` as already seen
    pub fn with_seen(mut self, source: &str) -> Self {
        self.last = Some(md5::compute(source));
        self
    }

    /// Read the file once; `Some` when its contents differ from the last read
    pub async fn poll(&mut self) -> Option<String> {
        let source = match tokio::fs::read_to_string(&self.path).await {
            Ok(source) => source,
            Err(error) => {
                if !self.failing {
                    log::warn!("Failed to read {}: {}", self.path.display(), error);
                    self.failing = true;
                }
                return None;
            }
        };
        self.failing = false;

        let digest = md5::compute(&source);
        if self.last == Some(digest) {
            return None;
        }
        self.last = Some(digest);
        Some(source)
    }

    /// Poll every `interval` until the task is aborted
    pub async fn run(mut self, preview: Arc<Preview>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Some(source) = self.poll().await {
                log::info!("{} changed", self.path.display());
                preview.on_source_changed(source);
            }
        }
    }
}
