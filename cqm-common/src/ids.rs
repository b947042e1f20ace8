//! Channel and clip identifiers

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Playback channel identifier
///
/// Channels are independent FIFO lanes (e.g. voice on 0, effects on 1).
/// Operations that accept no explicit channel resolve to [`ChannelId::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Channel used when the caller does not name one
    pub const DEFAULT: ChannelId = ChannelId(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for ChannelId {
    fn from(value: u32) -> Self {
        ChannelId(value)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(ChannelId)
            .map_err(|e| Error::InvalidInput(format!("Invalid channel id '{}': {}", s, e)))
    }
}

/// Identity of one clip handle
///
/// Assigned at enqueue time. Finished notifications carry it so the
/// manager can tell a current notification from a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Generate a fresh clip id (UUIDv4)
    pub fn generate() -> Self {
        ClipId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
