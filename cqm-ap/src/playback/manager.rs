//! Channel Queue Manager
//!
//! Owns the channel registry and drives every channel's state machine.
//!
//! Advancement has exactly three triggers, each of which removes the old
//! head before starting the next one:
//! - a `finished`/`failed` notification for the active clip
//! - `stop_current`
//! - a clip whose `start()` returned an error
//!
//! Enqueue only starts playback when the new entry is the only one in its
//! channel. Together with `Channel::next_to_start` refusing to hand out a
//! head while a clip is playing, at most one clip per channel is ever active.

use std::collections::BTreeMap;

use cqm_common::{ChannelId, ClipId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::channel::{Channel, QueuedClip};
use super::clip::{ClipNotifier, PlaybackBackend};
use crate::events::{
    ChannelSnapshot, ClipEvent, ClipOutcome, EventBus, QueueChangeTrigger, QueueEvent,
};

/// Per-channel FIFO playback of clips
///
/// Plain `&mut self` state machine. Completion notifications arrive on the
/// receiver returned by [`ChannelQueueManager::new`] and must be fed back
/// through [`ChannelQueueManager::handle_clip_event`] (the
/// [`QueueService`](super::QueueService) does this).
pub struct ChannelQueueManager {
    backend: Box<dyn PlaybackBackend>,
    channels: BTreeMap<ChannelId, Channel>,
    clip_tx: mpsc::UnboundedSender<ClipEvent>,
    event_bus: EventBus,
}

impl ChannelQueueManager {
    /// Create a manager with an empty registry
    ///
    /// Returns the receiver on which clip handles report completion.
    pub fn new(
        backend: impl PlaybackBackend + 'static,
        event_bus: EventBus,
    ) -> (Self, mpsc::UnboundedReceiver<ClipEvent>) {
        let (clip_tx, clip_rx) = mpsc::unbounded_channel();
        let manager = Self {
            backend: Box::new(backend),
            channels: BTreeMap::new(),
            clip_tx,
            event_bus,
        };
        (manager, clip_rx)
    }

    /// Append a clip to `channel`, starting it if the channel was empty
    ///
    /// The channel is created on first use. When this call returns, `start()`
    /// has been called on the new clip if it is at the head. Locator problems
    /// never surface here; they arrive later as a failed completion.
    pub fn enqueue(&mut self, locator: &str, channel_id: ChannelId) -> ClipId {
        let handle = self.backend.create_clip(locator);
        let clip_id = ClipId::generate();

        let channel = self.channels.entry(channel_id).or_insert_with(|| {
            debug!(channel = %channel_id, "Creating channel");
            Channel::new(channel_id)
        });
        let position = channel.push(QueuedClip::new(clip_id, handle));

        debug!(channel = %channel_id, %clip_id, locator, position, "Clip enqueued");
        self.event_bus.emit_lossy(QueueEvent::ClipEnqueued {
            channel: channel_id,
            clip_id,
            locator: locator.to_string(),
            position,
            timestamp: chrono::Utc::now(),
        });
        self.publish_queue_changed(channel_id, QueueChangeTrigger::Enqueue);

        // Queue length became 1: nothing ahead of us, start now
        if position == 0 {
            self.advance(channel_id);
        }

        clip_id
    }

    /// Feed a finished/failed notification into the state machine
    ///
    /// Notifications for anything but the channel's active clip are stale
    /// (cancelled, cleared, or already completed clips) and are ignored.
    pub fn handle_clip_event(&mut self, event: ClipEvent) {
        let ClipEvent {
            channel: channel_id,
            clip_id,
            outcome,
        } = event;

        let Some(channel) = self.channels.get_mut(&channel_id) else {
            debug!(channel = %channel_id, %clip_id, "Notification for unknown channel ignored");
            return;
        };

        let Some(clip) = channel.complete_active(clip_id) else {
            debug!(channel = %channel_id, %clip_id, ?outcome, "Ignoring stale clip notification");
            return;
        };

        let trigger = match outcome {
            ClipOutcome::Finished => {
                info!(channel = %channel_id, %clip_id, locator = clip.locator(), "Clip finished");
                self.event_bus.emit_lossy(QueueEvent::ClipCompleted {
                    channel: channel_id,
                    clip_id,
                    completed: true,
                    timestamp: chrono::Utc::now(),
                });
                QueueChangeTrigger::Completion
            }
            ClipOutcome::Failed(reason) => {
                warn!(
                    channel = %channel_id,
                    %clip_id,
                    locator = clip.locator(),
                    "Clip playback failed: {}", reason
                );
                self.event_bus.emit_lossy(QueueEvent::ClipFailed {
                    channel: channel_id,
                    clip_id,
                    reason,
                    timestamp: chrono::Utc::now(),
                });
                QueueChangeTrigger::Failure
            }
        };
        drop(clip);

        self.publish_queue_changed(channel_id, trigger);
        self.advance(channel_id);
    }

    /// Process every notification already waiting on `clip_rx`
    ///
    /// For callers that drive the manager synchronously instead of through
    /// the queue service. Returns the number of notifications handled.
    pub fn drain_clip_events(&mut self, clip_rx: &mut mpsc::UnboundedReceiver<ClipEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = clip_rx.try_recv() {
            self.handle_clip_event(event);
            handled += 1;
        }
        handled
    }

    /// Skip the active clip and start the next one immediately
    ///
    /// No-op for an unknown or empty channel.
    pub fn stop_current(&mut self, channel_id: ChannelId) {
        let Some(channel) = self.channels.get_mut(&channel_id) else {
            debug!(channel = %channel_id, "stop_current: no such channel");
            return;
        };
        let Some(clip) = channel.stop_current() else {
            debug!(channel = %channel_id, "stop_current: channel empty");
            return;
        };

        info!(channel = %channel_id, clip_id = %clip.clip_id, locator = clip.locator(), "Clip skipped");
        self.event_bus.emit_lossy(QueueEvent::ClipCompleted {
            channel: channel_id,
            clip_id: clip.clip_id,
            completed: false,
            timestamp: chrono::Utc::now(),
        });
        drop(clip);

        self.publish_queue_changed(channel_id, QueueChangeTrigger::StopCurrent);
        self.advance(channel_id);
    }

    /// Cancel the active clip and discard everything queued behind it
    ///
    /// No-op for an unknown channel. The channel stays registered, idle.
    pub fn stop_channel(&mut self, channel_id: ChannelId) {
        let Some(channel) = self.channels.get_mut(&channel_id) else {
            debug!(channel = %channel_id, "stop_channel: no such channel");
            return;
        };

        let cleared = channel.clear();
        if cleared.is_empty() {
            debug!(channel = %channel_id, "stop_channel: channel already empty");
            return;
        }

        info!(
            channel = %channel_id,
            was_playing = cleared.active.is_some(),
            discarded = cleared.pending.len(),
            "Channel stopped"
        );
        if let Some(active) = &cleared.active {
            self.event_bus.emit_lossy(QueueEvent::ClipCompleted {
                channel: channel_id,
                clip_id: active.clip_id,
                completed: false,
                timestamp: chrono::Utc::now(),
            });
        }
        drop(cleared);

        self.publish_queue_changed(channel_id, QueueChangeTrigger::StopChannel);
        self.event_bus.emit_lossy(QueueEvent::ChannelIdle {
            channel: channel_id,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Stop every registered channel
    pub fn stop_all(&mut self) {
        let ids: Vec<ChannelId> = self.channels.keys().copied().collect();
        debug!(channels = ids.len(), "Stopping all channels");
        for id in ids {
            self.stop_channel(id);
        }
    }

    /// Stop everything and forget all channels
    pub fn reset(&mut self) {
        self.stop_all();
        let removed: Vec<ChannelId> = std::mem::take(&mut self.channels).into_keys().collect();
        for &channel_id in &removed {
            self.publish_queue_changed(channel_id, QueueChangeTrigger::Reset);
        }
        info!(removed = removed.len(), "Channel registry reset");
    }

    /// Number of entries (active + pending); 0 for unknown channels
    pub fn queue_len(&self, channel_id: ChannelId) -> usize {
        self.channels.get(&channel_id).map_or(0, Channel::len)
    }

    pub fn is_playing(&self, channel_id: ChannelId) -> bool {
        self.channels
            .get(&channel_id)
            .is_some_and(Channel::is_playing)
    }

    pub fn active_clip(&self, channel_id: ChannelId) -> Option<ClipId> {
        self.channels.get(&channel_id).and_then(Channel::active_clip)
    }

    /// Registered channels in ascending order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.keys().copied().collect()
    }

    pub fn snapshot(&self, channel_id: ChannelId) -> Option<ChannelSnapshot> {
        self.channels.get(&channel_id).map(Channel::snapshot)
    }

    /// Snapshots of every registered channel, ordered by channel id
    pub fn snapshot_all(&self) -> Vec<ChannelSnapshot> {
        self.channels.values().map(Channel::snapshot).collect()
    }

    /// Start the channel's head, skipping heads that fail to start
    fn advance(&mut self, channel_id: ChannelId) {
        let Some(channel) = self.channels.get_mut(&channel_id) else {
            return;
        };

        let mut failed_starts = 0;
        while let Some(head) = channel.next_to_start() {
            let clip_id = head.clip_id;
            let notifier = ClipNotifier::new(channel_id, clip_id, self.clip_tx.clone());

            match head.handle.start(notifier) {
                Ok(()) => {
                    let locator = head.locator().to_string();
                    channel.mark_playing(clip_id);
                    info!(channel = %channel_id, %clip_id, %locator, "Clip started");
                    self.event_bus.emit_lossy(QueueEvent::ClipStarted {
                        channel: channel_id,
                        clip_id,
                        locator,
                        timestamp: chrono::Utc::now(),
                    });
                    break;
                }
                Err(e) => {
                    warn!(
                        channel = %channel_id,
                        %clip_id,
                        locator = head.locator(),
                        "Clip failed to start: {}", e
                    );
                    channel.discard_head();
                    failed_starts += 1;
                    self.event_bus.emit_lossy(QueueEvent::ClipFailed {
                        channel: channel_id,
                        clip_id,
                        reason: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        }

        let idle = !channel.is_playing();
        if failed_starts > 0 {
            self.publish_queue_changed(channel_id, QueueChangeTrigger::Failure);
        }
        if idle {
            debug!(channel = %channel_id, "Channel idle");
            self.event_bus.emit_lossy(QueueEvent::ChannelIdle {
                channel: channel_id,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn publish_queue_changed(&self, channel_id: ChannelId, trigger: QueueChangeTrigger) {
        let queue = self
            .channels
            .get(&channel_id)
            .map(Channel::clip_ids)
            .unwrap_or_default();
        self.event_bus.emit_lossy(QueueEvent::QueueChanged {
            channel: channel_id,
            queue,
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }
}
