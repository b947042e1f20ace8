//! Command-line clip arguments

use std::fmt;
use std::str::FromStr;

use cqm_common::ChannelId;

use crate::error::{Error, Result};

/// One positional `CLIP` argument: `LOCATOR` or `CHANNEL=LOCATOR`
///
/// The part before the first `=` is a channel only if it parses as an
/// unsigned integer; otherwise the whole argument is the locator (URLs with
/// query strings keep working).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSpec {
    pub channel: ChannelId,
    pub locator: String,
}

impl FromStr for ClipSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (channel, locator) = match s.split_once('=') {
            Some((prefix, rest)) => match prefix.parse::<u32>() {
                Ok(n) => (ChannelId(n), rest),
                Err(_) => (ChannelId::DEFAULT, s),
            },
            None => (ChannelId::DEFAULT, s),
        };

        if locator.trim().is_empty() {
            return Err(Error::InvalidInput(format!("empty locator in '{}'", s)));
        }

        Ok(Self {
            channel,
            locator: locator.to_string(),
        })
    }
}

impl fmt::Display for ClipSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.channel, self.locator)
    }
}
