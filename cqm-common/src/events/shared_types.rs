//! Shared type definitions for event data

use serde::{Deserialize, Serialize};

use super::queue_types::ChannelStatus;
use crate::{ChannelId, ClipId};

/// Queue entry information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntryInfo {
    /// Clip identity
    pub clip_id: ClipId,
    /// Source locator the clip was created from
    pub locator: String,
}

/// Point-in-time view of one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Channel identifier
    pub channel: ChannelId,
    /// Idle or playing
    pub status: ChannelStatus,
    /// Clip currently playing (always the head of `queue`)
    pub active: Option<ClipId>,
    /// All entries, head first
    pub queue: Vec<QueueEntryInfo>,
}

impl ChannelSnapshot {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        self.status == ChannelStatus::Idle
    }
}
