//! Event types for the channel queue event system
//!
//! Provides the shared event definitions and the EventBus.

mod queue_types;
mod shared_types;

pub use queue_types::{ChannelStatus, QueueChangeTrigger};
pub use shared_types::{ChannelSnapshot, QueueEntryInfo};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{ChannelId, ClipId};

/// Channel queue event types
///
/// Events are broadcast via EventBus and can be serialized (tagged by `type`)
/// for logging or forwarding to a UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// Clip appended to a channel queue
    ClipEnqueued {
        channel: ChannelId,
        clip_id: ClipId,
        locator: String,
        /// 0-based position in the queue (0 = will play now)
        position: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Clip became the active clip of its channel and `start()` was called
    ClipStarted {
        channel: ChannelId,
        clip_id: ClipId,
        locator: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Clip left its channel
    ///
    /// `completed` is false when the clip was skipped or cleared before it
    /// finished (stop current / stop channel).
    ClipCompleted {
        channel: ChannelId,
        clip_id: ClipId,
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Clip could not be played; the queue advanced past it
    ClipFailed {
        channel: ChannelId,
        clip_id: ClipId,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Channel queue contents changed
    QueueChanged {
        channel: ChannelId,
        /// Clip ids, head first
        queue: Vec<ClipId>,
        trigger: QueueChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Channel has nothing left to play
    ChannelIdle {
        channel: ChannelId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl QueueEvent {
    /// Channel the event belongs to
    pub fn channel(&self) -> ChannelId {
        match self {
            QueueEvent::ClipEnqueued { channel, .. }
            | QueueEvent::ClipStarted { channel, .. }
            | QueueEvent::ClipCompleted { channel, .. }
            | QueueEvent::ClipFailed { channel, .. }
            | QueueEvent::QueueChanged { channel, .. }
            | QueueEvent::ChannelIdle { channel, .. } => *channel,
        }
    }

    /// Event type name, as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::ClipEnqueued { .. } => "ClipEnqueued",
            QueueEvent::ClipStarted { .. } => "ClipStarted",
            QueueEvent::ClipCompleted { .. } => "ClipCompleted",
            QueueEvent::ClipFailed { .. } => "ClipFailed",
            QueueEvent::QueueChanged { .. } => "QueueChanged",
            QueueEvent::ChannelIdle { .. } => "ChannelIdle",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use cqm_common::events::{EventBus, QueueEvent};
/// use cqm_common::ChannelId;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(QueueEvent::ChannelIdle {
///     channel: ChannelId::DEFAULT,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<QueueEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: QueueEvent,
    ) -> Result<usize, broadcast::error::SendError<QueueEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: QueueEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
