use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type Id = String;

/// Lifecycle of one write channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl WriteStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, WriteStatus::Pending)
    }
}

/// The three independently versioned writes behind one screen save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Primary,
    Groups,
    Playlists,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Primary => "primary",
            Channel::Groups => "groups",
            Channel::Playlists => "playlists",
        };
        f.write_str(name)
    }
}

/// Identifies one submit cycle. Completions carry the token of the dispatch
/// that produced them so late arrivals from an earlier cycle can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleToken(Uuid);

impl CycleToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
