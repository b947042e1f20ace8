//! Queue change type definitions
//!
//! Supporting types for queue events.

use serde::{Deserialize, Serialize};

/// Why a channel's queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    /// A clip was appended
    Enqueue,
    /// The active clip finished naturally
    Completion,
    /// The active clip failed to play
    Failure,
    /// The active clip was skipped
    StopCurrent,
    /// The whole channel was cleared
    StopChannel,
    /// The registry was reset
    Reset,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::Enqueue => write!(f, "Enqueue"),
            QueueChangeTrigger::Completion => write!(f, "Completion"),
            QueueChangeTrigger::Failure => write!(f, "Failure"),
            QueueChangeTrigger::StopCurrent => write!(f, "StopCurrent"),
            QueueChangeTrigger::StopChannel => write!(f, "StopChannel"),
            QueueChangeTrigger::Reset => write!(f, "Reset"),
        }
    }
}

/// Channel playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Idle,
    Playing,
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelStatus::Idle => write!(f, "idle"),
            ChannelStatus::Playing => write!(f, "playing"),
        }
    }
}
