//! Simulated playback backend
//!
//! Stands in for a real audio device: each clip "plays" for a fixed
//! duration on a tokio timer, then reports finished. Local paths that do
//! not exist report a failure instead, like a real primitive would; the
//! lookup runs on the clip's own task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::clip::{ClipHandle, ClipNotifier, PlaybackBackend};
use crate::error::{Error, Result};

/// Backend whose clips last `clip_duration` each
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    clip_duration: Duration,
}

impl SimulatedBackend {
    pub fn new(clip_duration: Duration) -> Self {
        Self { clip_duration }
    }

    pub fn clip_duration(&self) -> Duration {
        self.clip_duration
    }
}

impl PlaybackBackend for SimulatedBackend {
    fn create_clip(&mut self, locator: &str) -> Box<dyn ClipHandle> {
        Box::new(SimulatedClip {
            locator: locator.to_string(),
            duration: self.clip_duration,
            task: None,
        })
    }
}

/// True for `scheme://...` locators, which are not checked on disk
fn is_url(locator: &str) -> bool {
    locator.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

struct SimulatedClip {
    locator: String,
    duration: Duration,
    task: Option<JoinHandle<()>>,
}

impl ClipHandle for SimulatedClip {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn start(&mut self, notifier: ClipNotifier) -> Result<()> {
        if self.locator.trim().is_empty() {
            return Err(Error::Playback("empty locator".to_string()));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Playback(format!("no async runtime: {}", e)))?;

        let duration = self.duration;
        let locator = self.locator.clone();
        let local_file = !is_url(&locator);
        self.task = Some(runtime.spawn(async move {
            // Disk lookup stays off the task that called start()
            if local_file && !tokio::fs::try_exists(&locator).await.unwrap_or(false) {
                notifier.failed(format!("file not found: {}", locator));
                return;
            }
            tokio::time::sleep(duration).await;
            debug!(%locator, "Simulated clip reached end");
            notifier.finished();
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedClip {
    fn drop(&mut self) {
        self.cancel();
    }
}
