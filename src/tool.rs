//! Destruction tools a user can pick

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four ways to destroy a mood note; each has its own sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tool {
    Rocket,
    Shredder,
    Bubble,
    BlackHole,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Rocket, Tool::Shredder, Tool::Bubble, Tool::BlackHole];

    /// Wire name, e.g. `BLACK_HOLE`
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Rocket => "ROCKET",
            Tool::Shredder => "SHREDDER",
            Tool::Bubble => "BUBBLE",
            Tool::BlackHole => "BLACK_HOLE",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown tool: {0:?}")]
pub struct ParseToolError(pub String);

impl FromStr for Tool {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseToolError(s.to_string()))
    }
}
