//! Common types used across the GOAP planner.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cost of a single action.
pub type Cost = u32;

/// Identifier of a boolean proposition, e.g. `"hasWood"` or `"State.Fire.Lit"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropositionId(String);

impl PropositionId {
    /// Create a new proposition id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropositionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PropositionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PropositionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Status of a planning agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// No search has been requested yet.
    #[default]
    Idle,
    /// A search is running.
    Planning,
    /// The last search produced a plan.
    Complete,
    /// The last search found no plan or was aborted.
    Failed,
}

impl PlanStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Complete | PlanStatus::Failed)
    }

    /// Returns true if a search is currently running.
    pub fn is_active(&self) -> bool {
        matches!(self, PlanStatus::Planning)
    }
}
