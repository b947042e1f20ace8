//! Playback primitive contract
//!
//! The queue manager never decodes or renders audio. It consumes two traits:
//! [`PlaybackBackend`] builds a [`ClipHandle`] from a locator, and the handle
//! starts, cancels, and reports completion through a [`ClipNotifier`].

use cqm_common::{ChannelId, ClipId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::events::{ClipEvent, ClipOutcome};

/// Factory for playable clip handles.
/// Implementations: SimulatedBackend (CLI), RecordingBackend (testing).
pub trait PlaybackBackend: Send {
    /// Build a handle for `locator` without starting playback.
    ///
    /// Never fails: an unusable locator shows up later as a failed start.
    fn create_clip(&mut self, locator: &str) -> Box<dyn ClipHandle>;
}

/// One playable unit
pub trait ClipHandle: Send {
    /// Locator the handle was created from
    fn locator(&self) -> &str;

    /// Begin playback.
    ///
    /// Completion is reported later through `notifier`. Returning `Err` means
    /// playback could not start at all; the manager treats it like a failed
    /// completion and moves on.
    fn start(&mut self, notifier: ClipNotifier) -> Result<()>;

    /// Stop playback immediately. Must be safe to call before `start`, after
    /// completion, and more than once.
    fn cancel(&mut self);
}

/// One-shot completion sender handed to [`ClipHandle::start`]
///
/// `finished` and `failed` consume the notifier, so a handle reports at most
/// once. Dropping it without reporting leaves the channel playing.
#[derive(Debug)]
pub struct ClipNotifier {
    channel: ChannelId,
    clip_id: ClipId,
    tx: mpsc::UnboundedSender<ClipEvent>,
}

impl ClipNotifier {
    pub(crate) fn new(
        channel: ChannelId,
        clip_id: ClipId,
        tx: mpsc::UnboundedSender<ClipEvent>,
    ) -> Self {
        Self { channel, clip_id, tx }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn clip_id(&self) -> ClipId {
        self.clip_id
    }

    /// Playback reached its natural end
    pub fn finished(self) {
        self.send(ClipOutcome::Finished);
    }

    /// Playback failed; the queue will advance past this clip
    pub fn failed(self, reason: impl Into<String>) {
        self.send(ClipOutcome::Failed(reason.into()));
    }

    fn send(self, outcome: ClipOutcome) {
        let event = ClipEvent {
            channel: self.channel,
            clip_id: self.clip_id,
            outcome,
        };
        if self.tx.send(event).is_err() {
            debug!(
                channel = %self.channel,
                clip_id = %self.clip_id,
                "Queue manager gone, dropping clip notification"
            );
        }
    }
}
