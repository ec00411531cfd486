//! Tracked platform identifiers
//!
//! The set of platforms is fixed; each one maps to a stable lowercase
//! storage key and a display name used in broadcast messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A platform whose follower/subscriber/member count is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Telegram,
    Instagram,
}

impl Platform {
    /// All tracked platforms, in fetch order
    pub const ALL: [Platform; 3] = [Platform::YouTube, Platform::Telegram, Platform::Instagram];

    /// Lowercase key used for database rows
    pub fn key(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Telegram => "telegram",
            Platform::Instagram => "instagram",
        }
    }

    /// Display name used in messages and API responses
    pub fn name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Telegram => "Telegram",
            Platform::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::YouTube),
            "telegram" => Ok(Platform::Telegram),
            "instagram" => Ok(Platform::Instagram),
            other => Err(Error::InvalidInput(format!("unknown platform: {}", other))),
        }
    }
}
