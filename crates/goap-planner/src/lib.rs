//! # GOAP Planner
//!
//! Iterative-deepening A* planning engine for GOAP action catalogs.

pub mod ida;
pub mod planner;

pub use ida::IdaStarPlanner;
pub use planner::{HeuristicKind, Planner, PlannerConfig, SearchMode};
