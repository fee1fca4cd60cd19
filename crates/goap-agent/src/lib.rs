//! # GOAP Agent
//!
//! Runs planner searches in the background for an agent, keeps the last plan
//! for the plan accessor, and loads scenario files for the demo runner.

pub mod agent;
pub mod scenario;

pub use agent::{CompletionNotifier, PlanningAgent};
pub use scenario::Scenario;
