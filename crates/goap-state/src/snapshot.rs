//! Point-in-time copies of the world.

use chrono::{DateTime, Utc};
use goap_core::PropositionSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point-in-time snapshot of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Unique ID for this snapshot.
    pub id: Uuid,

    /// Version of the world at snapshot time.
    pub version: u64,

    /// Timestamp when the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Every known proposition at snapshot time.
    pub state: PropositionSet,
}

impl WorldSnapshot {
    /// Get a value from the snapshot.
    pub fn get(&self, id: &str) -> Option<bool> {
        self.state.get(id)
    }

    /// Get the number of known propositions.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Whether the world has changed between two snapshots.
    pub fn is_stale_against(&self, newer: &WorldSnapshot) -> bool {
        self.version != newer.version
    }

    /// Consume the snapshot, keeping only the propositions.
    pub fn into_state(self) -> PropositionSet {
        self.state
    }
}
