//! Recording playback backend
//!
//! Test double for the playback primitive. Every clip it creates writes
//! into shared state, so a test can inspect start/cancel calls and decide
//! when each clip finishes or fails.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clip::{ClipHandle, ClipNotifier, PlaybackBackend};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct RecordedClip {
    locator: String,
    starts: usize,
    cancels: usize,
    notifier: Option<ClipNotifier>,
}

#[derive(Debug, Default)]
struct Recording {
    clips: Vec<RecordedClip>,
    start_order: Vec<String>,
    fail_start: HashSet<String>,
}

/// Backend that records calls instead of playing audio
///
/// Cloning shares the recording, so keep a clone after handing one to the
/// manager.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `start()` return an error for every clip with this locator
    pub fn fail_start(&self, locator: &str) {
        self.lock().fail_start.insert(locator.to_string());
    }

    /// Locators in the order their clips were created
    pub fn created(&self) -> Vec<String> {
        self.lock().clips.iter().map(|c| c.locator.clone()).collect()
    }

    /// Locators in the order their clips successfully started
    pub fn start_order(&self) -> Vec<String> {
        self.lock().start_order.clone()
    }

    /// Successful starts across all clips with this locator
    pub fn start_count(&self, locator: &str) -> usize {
        self.lock()
            .clips
            .iter()
            .filter(|c| c.locator == locator)
            .map(|c| c.starts)
            .sum()
    }

    /// Cancel calls across all clips with this locator
    pub fn cancel_count(&self, locator: &str) -> usize {
        self.lock()
            .clips
            .iter()
            .filter(|c| c.locator == locator)
            .map(|c| c.cancels)
            .sum()
    }

    /// Locators of clips that started, were not cancelled, and have not reported yet
    pub fn playing(&self) -> Vec<String> {
        self.lock()
            .clips
            .iter()
            .filter(|c| c.starts > 0 && c.cancels == 0 && c.notifier.is_some())
            .map(|c| c.locator.clone())
            .collect()
    }

    /// Take the notifier of the earliest unreported clip with this locator
    ///
    /// Lets a test fire a notification at a moment of its choosing, e.g.
    /// after the clip was cancelled.
    pub fn take_notifier(&self, locator: &str) -> Option<ClipNotifier> {
        self.lock()
            .clips
            .iter_mut()
            .find(|c| c.locator == locator && c.notifier.is_some())
            .and_then(|c| c.notifier.take())
    }

    /// Report natural completion for the earliest unreported clip with this locator
    ///
    /// Returns false if no such clip holds a notifier.
    pub fn finish(&self, locator: &str) -> bool {
        match self.take_notifier(locator) {
            Some(notifier) => {
                notifier.finished();
                true
            }
            None => false,
        }
    }

    /// Report a playback failure for the earliest unreported clip with this locator
    pub fn fail(&self, locator: &str, reason: &str) -> bool {
        match self.take_notifier(locator) {
            Some(notifier) => {
                notifier.failed(reason);
                true
            }
            None => false,
        }
    }
}

impl PlaybackBackend for RecordingBackend {
    fn create_clip(&mut self, locator: &str) -> Box<dyn ClipHandle> {
        let mut recording = self.lock();
        recording.clips.push(RecordedClip {
            locator: locator.to_string(),
            ..Default::default()
        });
        Box::new(RecordingClip {
            index: recording.clips.len() - 1,
            locator: locator.to_string(),
            inner: self.inner.clone(),
        })
    }
}

struct RecordingClip {
    index: usize,
    locator: String,
    inner: Arc<Mutex<Recording>>,
}

impl RecordingClip {
    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ClipHandle for RecordingClip {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn start(&mut self, notifier: ClipNotifier) -> Result<()> {
        let mut recording = self.lock();
        if recording.fail_start.contains(&self.locator) {
            return Err(Error::Playback(format!("cannot open {}", self.locator)));
        }
        recording.start_order.push(self.locator.clone());
        let clip = &mut recording.clips[self.index];
        clip.starts += 1;
        clip.notifier = Some(notifier);
        Ok(())
    }

    fn cancel(&mut self) {
        // Notifier stays in place: a real primitive may still fire late
        self.lock().clips[self.index].cancels += 1;
    }
}
