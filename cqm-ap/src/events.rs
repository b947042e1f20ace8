//! Event system for cqm-ap
//!
//! Two kinds of traffic:
//! - **EventBus** (tokio::broadcast): queue events published to any listener
//! - **Clip events** (tokio::mpsc): playback primitive -> queue manager
//!
//! This module re-exports shared event types from cqm-common and defines the
//! internal clip notification types.

use cqm_common::{ChannelId, ClipId};

// ========================================
// Re-exports from cqm-common
// ========================================

pub use cqm_common::events::{
    ChannelSnapshot, ChannelStatus, EventBus, QueueChangeTrigger, QueueEntryInfo, QueueEvent,
};

// ========================================
// Internal Events (cqm-ap only)
// ========================================

/// How a clip's playback ended, as reported by the playback primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Playback reached its natural end
    Finished,

    /// Playback could not start or broke off (bad locator, decode error, ...)
    ///
    /// Treated like `Finished` for queue advancement.
    Failed(String),
}

/// One-shot notification from a clip handle
///
/// Delivered over an unbounded mpsc channel so a playback primitive can report
/// from any thread. Consumed only by `ChannelQueueManager::handle_clip_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipEvent {
    pub channel: ChannelId,
    pub clip_id: ClipId,
    pub outcome: ClipOutcome,
}
