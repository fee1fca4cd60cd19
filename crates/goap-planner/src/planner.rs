//! Planner trait and configuration.

use goap_core::{ActionCatalog, GoapError, Plan, PropositionSet, Result};
use serde::{Deserialize, Serialize};

/// How the search decides that a candidate node is already on the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// An action may appear at most once on a path. Path length is bounded by
    /// the catalog size, so the search always terminates, but plans that need
    /// the same action twice are never found.
    #[default]
    UniqueActions,
    /// A world state may appear at most once on a path. Actions may repeat when
    /// they are applied to a genuinely different state.
    UniqueStates,
}

/// Distance estimate used for the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Number of goal propositions not yet satisfied.
    #[default]
    Mismatch,
    /// Mismatch count plus the positional penalty of earlier planner versions.
    Legacy,
}

impl HeuristicKind {
    /// Estimate the distance from `state` to `goal`.
    pub fn estimate(&self, state: &PropositionSet, goal: &PropositionSet) -> u32 {
        match self {
            HeuristicKind::Mismatch => state.calculate_heuristic(goal),
            HeuristicKind::Legacy => state.legacy_heuristic(goal),
        }
    }
}

/// Configuration for the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Repeat detection along a path.
    pub search_mode: SearchMode,

    /// Heuristic used for H.
    pub heuristic: HeuristicKind,

    /// Maximum number of bounded passes (bound increases) before giving up.
    pub max_iterations: Option<usize>,

    /// Maximum number of node expansions over the whole run.
    pub max_expansions: Option<usize>,

    /// Maximum planning time in milliseconds.
    pub max_planning_time_ms: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::UniqueActions,
            heuristic: HeuristicKind::Mismatch,
            max_iterations: Some(1_024),
            max_expansions: Some(100_000),
            max_planning_time_ms: None,
        }
    }
}

impl PlannerConfig {
    /// A configuration with every limit removed.
    pub fn unbounded() -> Self {
        Self {
            max_iterations: None,
            max_expansions: None,
            max_planning_time_ms: None,
            ..Self::default()
        }
    }

    /// Set the repeat detection mode.
    pub fn with_search_mode(mut self, search_mode: SearchMode) -> Self {
        self.search_mode = search_mode;
        self
    }

    /// Set the heuristic.
    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }
}

/// Trait for planning engines.
pub trait Planner: Send + Sync {
    /// Find an ordered list of actions turning `start` into a state that meets `goal`.
    ///
    /// A start that already meets the goal yields an empty plan.
    fn find_plan(&self, start: &PropositionSet, goal: &PropositionSet) -> Result<Plan>;

    /// The actions this planner searches over.
    fn catalog(&self) -> &ActionCatalog;

    /// Get the planner configuration.
    fn config(&self) -> &PlannerConfig;

    /// Update the planner configuration.
    fn set_config(&mut self, config: PlannerConfig);

    /// Check if a plan can still run, step by step, from `current_state`.
    fn validate_plan(&self, plan: &Plan, current_state: &PropositionSet) -> Result<bool> {
        if let Some(ref fingerprint) = plan.catalog_fingerprint {
            if fingerprint != self.catalog().fingerprint() {
                return Err(GoapError::IncompatibleCatalog {
                    message: format!("plan {} was built from catalog {}", plan.id, fingerprint),
                });
            }
        }

        let mut state = current_state.clone();
        for step in &plan.steps {
            if !step.action.operable_on(&state) {
                return Ok(false);
            }
            state = step.action.act_on(&state);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"search_mode":"unique_states"}"#).unwrap();
        assert_eq!(config.search_mode, SearchMode::UniqueStates);
        assert_eq!(config.heuristic, HeuristicKind::Mismatch);
        assert_eq!(config.max_iterations, Some(1_024));
    }

    #[test]
    fn test_unbounded_config() {
        let config = PlannerConfig::unbounded().with_heuristic(HeuristicKind::Legacy);
        assert!(config.max_iterations.is_none());
        assert!(config.max_expansions.is_none());
        assert_eq!(config.heuristic, HeuristicKind::Legacy);
    }

    #[test]
    fn test_heuristic_kinds_differ_on_satisfied_state() {
        let goal = PropositionSet::new().with("a", true);
        let state = PropositionSet::new().with("a", true);
        assert_eq!(HeuristicKind::Mismatch.estimate(&state, &goal), 0);
        assert_eq!(HeuristicKind::Legacy.estimate(&state, &goal), 1);
    }
}
