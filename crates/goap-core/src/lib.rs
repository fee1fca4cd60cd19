//! # GOAP Core
//!
//! Core primitives and types for goal-oriented action planning.
//!
//! This crate provides the fundamental building blocks:
//! - [`PropositionSet`] - World states, goals, preconditions and effects
//! - [`Action`] - Costed transformation of a world state
//! - [`ActionCatalog`] - Ordered list of actions a planner may use
//! - [`Plan`] - Ordered steps from a start state to a goal
//! - [`GoapError`] - Planner error types

pub mod action;
pub mod catalog;
pub mod error;
pub mod plan;
pub mod proposition;
pub mod types;

// Re-exports for convenience
pub use action::{Action, ActionBuilder};
pub use catalog::ActionCatalog;
pub use error::{GoapError, Result, SearchLimit};
pub use plan::{simulate, Plan, PlanStep, SearchStats};
pub use proposition::PropositionSet;
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::action::{Action, ActionBuilder};
    pub use crate::catalog::ActionCatalog;
    pub use crate::error::{GoapError, Result};
    pub use crate::plan::{simulate, Plan, PlanStep};
    pub use crate::proposition::PropositionSet;
    pub use crate::types::{Cost, PlanStatus, PropositionId};
}
