//! # Channel Queue Manager Common Library
//!
//! Shared code for the channel queue manager crates:
//! - Channel and clip identifiers
//! - Event types (QueueEvent enum) and the EventBus
//! - Configuration file resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{ChannelId, ClipId};
