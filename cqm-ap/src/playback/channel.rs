//! Per-channel queue state
//!
//! A channel is a FIFO of clip handles plus an explicit state:
//!
//! ```text
//!            enqueue (queue was empty) + start ok
//!   Idle  ─────────────────────────────────────────▶  Playing(id)
//!    ▲                                                  │
//!    │   finished(id) / failed(id) / stop current       │
//!    └──────────── (then advance: start next head) ◀────┘
//!
//!   stop channel: cancel active, drop every entry, back to Idle
//! ```
//!
//! The active clip is always the queue head. `Playing` holds its id, so a
//! notification for any other id (for example a late `finished` after a
//! cancel) is recognised as stale.

use std::collections::VecDeque;

use cqm_common::{ChannelId, ClipId};
use tracing::debug;

use super::clip::ClipHandle;
use crate::events::{ChannelSnapshot, ChannelStatus, QueueEntryInfo};

/// Queue entry: a clip handle with its identity
pub struct QueuedClip {
    pub clip_id: ClipId,
    pub handle: Box<dyn ClipHandle>,
}

impl QueuedClip {
    pub fn new(clip_id: ClipId, handle: Box<dyn ClipHandle>) -> Self {
        Self { clip_id, handle }
    }

    pub fn locator(&self) -> &str {
        self.handle.locator()
    }
}

impl std::fmt::Debug for QueuedClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedClip")
            .field("clip_id", &self.clip_id)
            .field("locator", &self.handle.locator())
            .finish()
    }
}

/// Channel playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Nothing playing
    Idle,
    /// Head of the queue is playing
    Playing(ClipId),
}

/// Clips removed by a stop-channel
#[derive(Debug, Default)]
pub struct ClearedClips {
    /// The clip that was playing, already cancelled
    pub active: Option<QueuedClip>,
    /// Entries that never started
    pub pending: Vec<QueuedClip>,
}

impl ClearedClips {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}

/// One playback lane
#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    queue: VecDeque<QueuedClip>,
    state: ChannelState,
}

impl Channel {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            state: ChannelState::Idle,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ChannelState::Playing(_))
    }

    /// Clip currently playing
    pub fn active_clip(&self) -> Option<ClipId> {
        match self.state {
            ChannelState::Playing(id) => Some(id),
            ChannelState::Idle => None,
        }
    }

    /// Clip ids in play order, head first
    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.queue.iter().map(|c| c.clip_id).collect()
    }

    /// Append to the tail. Returns the 0-based position of the new entry.
    pub fn push(&mut self, clip: QueuedClip) -> usize {
        self.queue.push_back(clip);
        self.queue.len() - 1
    }

    /// Head waiting to be started
    ///
    /// `None` while a clip is playing, so a second advance can never start
    /// a clip next to the active one.
    pub fn next_to_start(&mut self) -> Option<&mut QueuedClip> {
        match self.state {
            ChannelState::Playing(_) => None,
            ChannelState::Idle => self.queue.front_mut(),
        }
    }

    /// Record that the head started playing
    pub fn mark_playing(&mut self, clip_id: ClipId) {
        debug_assert_eq!(self.queue.front().map(|c| c.clip_id), Some(clip_id));
        debug!(channel = %self.id, %clip_id, "Channel Idle -> Playing");
        self.state = ChannelState::Playing(clip_id);
    }

    /// Drop a head whose start failed (channel still Idle)
    pub fn discard_head(&mut self) -> Option<QueuedClip> {
        if self.is_playing() {
            return None;
        }
        self.queue.pop_front()
    }

    /// Finished or failed notification
    ///
    /// Removes and returns the head only if `clip_id` is the active clip.
    /// Anything else is a stale notification and changes nothing.
    pub fn complete_active(&mut self, clip_id: ClipId) -> Option<QueuedClip> {
        if self.state != ChannelState::Playing(clip_id) {
            return None;
        }
        self.state = ChannelState::Idle;
        debug!(channel = %self.id, %clip_id, "Channel Playing -> Idle (completed)");
        self.queue.pop_front()
    }

    /// Skip the head: forget it as active, cancel it, remove it
    ///
    /// The active marker is cleared before `cancel()` so a `finished` fired
    /// by the primitive during or after cancellation is stale.
    pub fn stop_current(&mut self) -> Option<QueuedClip> {
        let mut clip = self.queue.pop_front()?;
        self.state = ChannelState::Idle;
        clip.handle.cancel();
        debug!(channel = %self.id, clip_id = %clip.clip_id, "Channel -> Idle (stop current)");
        Some(clip)
    }

    /// Cancel the active clip and discard every entry
    pub fn clear(&mut self) -> ClearedClips {
        let mut cleared = ClearedClips::default();
        if let ChannelState::Playing(active_id) = self.state {
            self.state = ChannelState::Idle;
            if let Some(mut clip) = self.queue.pop_front() {
                debug_assert_eq!(clip.clip_id, active_id);
                clip.handle.cancel();
                cleared.active = Some(clip);
            }
        }
        cleared.pending = self.queue.drain(..).collect();
        cleared
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            channel: self.id,
            status: if self.is_playing() {
                ChannelStatus::Playing
            } else {
                ChannelStatus::Idle
            },
            active: self.active_clip(),
            queue: self
                .queue
                .iter()
                .map(|c| QueueEntryInfo {
                    clip_id: c.clip_id,
                    locator: c.locator().to_string(),
                })
                .collect(),
        }
    }
}
