//! Pack version state machine
//!
//! `Pending → Installing → Installed → Archived → Evicted`. A failed install
//! goes back to `Pending` so the next attempt can retry it. An archived or
//! evicted version that is installed again re-enters at `Pending`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one pack version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackState {
    /// Known but not yet installed (or a failed install awaiting retry)
    Pending,
    /// Entries are being written into the pack's store
    Installing,
    /// Current pack consulted by the router
    Installed,
    /// Retained for rollback/offline availability, inactive
    Archived,
    /// Store and snapshot deleted
    Evicted,
}

impl PackState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: PackState) -> bool {
        use PackState::*;
        matches!(
            (self, next),
            (Pending, Installing)
                | (Installing, Installed)
                | (Installing, Pending)
                | (Installed, Archived)
                | (Installed, Evicted)
                | (Archived, Evicted)
                | (Archived, Pending)
                | (Evicted, Pending)
        )
    }
}

impl fmt::Display for PackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Archived => write!(f, "archived"),
            Self::Evicted => write!(f, "evicted"),
        }
    }
}
