//! # Channel Queue Audio Player Library (cqm-ap)
//!
//! Ordered, per-channel playback of discrete audio clips on top of a
//! host-provided playback primitive.
//!
//! **Purpose:** Keep one FIFO of clips per channel, play them strictly one at
//! a time, advance automatically when a clip finishes, and let callers skip
//! the current clip or clear a channel.
//!
//! **Architecture:** A `&mut self` state machine ([`ChannelQueueManager`])
//! owned by a single tokio task ([`QueueService`]) and driven through a
//! cloneable [`QueueHandle`].

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{
    ChannelQueueManager, ClipHandle, ClipNotifier, PlaybackBackend, QueueHandle, QueueService,
};
