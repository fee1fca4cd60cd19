//! Plans produced by the planner, and replaying them without searching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;
use crate::proposition::PropositionSet;

/// One step of a plan: the action taken and the world it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// The action taken.
    pub action: Action,

    /// World state after the action.
    pub state: PropositionSet,

    /// g(n): accumulated cost up to and including this step.
    pub g: u64,

    /// h(n): heuristic estimate from this step to the goal.
    pub h: u32,

    /// f(n) = g(n) + h(n).
    pub f: u64,
}

/// Bookkeeping from the search that produced a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of bounded depth-first passes.
    pub iterations: usize,

    /// Number of nodes whose children were generated.
    pub expansions: usize,

    /// Bound of each pass, in order. Never decreases.
    #[serde(default)]
    pub bounds: Vec<u64>,

    /// Bound of the pass that found the goal.
    pub final_bound: u64,

    /// Wall-clock time spent searching.
    pub elapsed_ms: u64,
}

/// An ordered sequence of steps leading from a start state to a goal.
///
/// The start state itself is not a step, so a start that already satisfies
/// the goal yields an empty plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: Uuid,

    /// Steps in execution order.
    pub steps: Vec<PlanStep>,

    /// Fingerprint of the action catalog the plan was built from.
    pub catalog_fingerprint: Option<String>,

    /// Search statistics.
    #[serde(default)]
    pub stats: SearchStats,

    /// When the plan was created.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
            catalog_fingerprint: None,
            stats: SearchStats::default(),
            created_at: Utc::now(),
        }
    }

    /// Record the catalog the plan was built from.
    pub fn with_catalog_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.catalog_fingerprint = Some(fingerprint.into());
        self
    }

    /// Append a step.
    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Insert a step at `index`.
    pub fn insert(&mut self, index: usize, step: PlanStep) {
        self.steps.insert(index, step);
    }

    /// Remove every step, keeping the plan for reuse.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.catalog_fingerprint = None;
        self.stats = SearchStats::default();
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over `(action, resulting state)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Action, &PropositionSet)> {
        self.steps.iter().map(|step| (&step.action, &step.state))
    }

    /// Names of the actions in order.
    pub fn action_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.action.name.as_str()).collect()
    }

    /// Sum of the action costs.
    pub fn total_cost(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.action.cost)).sum()
    }

    /// Apply every step's effects, in order, to a copy of `start`.
    pub fn simulate(&self, start: &PropositionSet) -> PropositionSet {
        simulate(start, self)
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply every step's effects, in order, to a copy of `start`.
///
/// Preconditions are not checked; this is what the plan's effects add up to,
/// not a validation that the plan can run from `start`.
pub fn simulate(start: &PropositionSet, plan: &Plan) -> PropositionSet {
    let mut state = start.clone();
    for step in &plan.steps {
        state.apply_effects(&step.action.effects);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, effects: PropositionSet, state: PropositionSet) -> PlanStep {
        PlanStep {
            action: Action::builder(name).cost(1).effects(effects).build().unwrap(),
            state,
            g: 1,
            h: 0,
            f: 1,
        }
    }

    #[test]
    fn test_empty_plan_simulates_to_start() {
        let start = PropositionSet::new().with("a", true);
        assert_eq!(Plan::new().simulate(&start), start);
    }

    #[test]
    fn test_simulate_applies_effects_in_order() {
        let mut plan = Plan::new();
        plan.push(step(
            "Light",
            PropositionSet::new().with("lit", true),
            PropositionSet::new(),
        ));
        plan.push(step(
            "Douse",
            PropositionSet::new().with("lit", false).with("wet", true),
            PropositionSet::new(),
        ));

        let start = PropositionSet::new().with("other", true);
        let end = simulate(&start, &plan);
        assert_eq!(end.get("lit"), Some(false));
        assert_eq!(end.get("wet"), Some(true));
        assert_eq!(end.get("other"), Some(true));
        assert_eq!(plan.total_cost(), 2);
        assert_eq!(plan.action_names(), ["Light", "Douse"]);
    }

    #[test]
    fn test_insert_and_clear() {
        let mut plan = Plan::new().with_catalog_fingerprint("abc");
        plan.push(step("B", PropositionSet::new(), PropositionSet::new()));
        plan.insert(0, step("A", PropositionSet::new(), PropositionSet::new()));
        assert_eq!(plan.action_names(), ["A", "B"]);

        plan.clear();
        assert!(plan.is_empty());
        assert!(plan.catalog_fingerprint.is_none());
    }
}
