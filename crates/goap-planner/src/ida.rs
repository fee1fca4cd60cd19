//! Iterative-deepening A* planner implementation.
//!
//! Each pass is a depth-first search that refuses to descend past nodes whose
//! `f = g + h` exceeds the current bound. When a pass fails, the smallest `f`
//! that was cut off becomes the next bound. Only the current path is kept in
//! memory; nodes refer to their parent by position in that path.

use std::time::Instant;

use goap_core::{
    Action, ActionCatalog, GoapError, Plan, PlanStep, PropositionSet, Result, SearchLimit,
    SearchStats,
};
use tracing::{debug, info, trace, warn};

use crate::planner::{Planner, PlannerConfig, SearchMode};

/// IDA* search-based planner.
pub struct IdaStarPlanner {
    config: PlannerConfig,
    /// Available actions the planner can use.
    catalog: ActionCatalog,
}

/// Node on the current search path.
struct SearchNode<'a> {
    /// World state at this node.
    state: PropositionSet,
    /// Cached content hash of `state`.
    state_hash: u64,
    /// Action that produced this node; `None` for the root.
    action: Option<&'a Action>,
    /// Position of this node in the path.
    id: usize,
    /// Position of the parent in the path; `None` for the root.
    parent: Option<usize>,
    /// g(n): accumulated cost from the start.
    g: u64,
    /// h(n): heuristic estimate to the goal.
    h: u32,
    /// f(n) = g(n) + h(n).
    f: u64,
}

impl SearchNode<'_> {
    fn same_state(&self, other: &SearchNode<'_>) -> bool {
        self.state_hash == other.state_hash && self.state == other.state
    }
}

/// Result of one bounded depth-first pass below a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// The goal is met by the last node of the path.
    Found,
    /// Nothing below met the goal; this is the smallest `f` that was cut off.
    Exceeded(u64),
    /// Nothing below met the goal and nothing was cut off.
    Exhausted,
}

/// State of a single `find_plan` call.
struct Search<'a> {
    planner: &'a IdaStarPlanner,
    goal: &'a PropositionSet,
    path: Vec<SearchNode<'a>>,
    iterations: usize,
    expansions: usize,
    bounds: Vec<u64>,
    started: Instant,
}

impl IdaStarPlanner {
    /// Create a new IDA* planner with default configuration.
    pub fn new(catalog: impl Into<ActionCatalog>) -> Self {
        Self::with_config(catalog, PlannerConfig::default())
    }

    /// Create a new IDA* planner with custom configuration.
    pub fn with_config(catalog: impl Into<ActionCatalog>, config: PlannerConfig) -> Self {
        let catalog = catalog.into();
        let duplicates = catalog.duplicate_names();
        if !duplicates.is_empty() && config.search_mode == SearchMode::UniqueActions {
            warn!(
                "Catalog has repeated action names {:?}; they count as one action on a path",
                duplicates
            );
        }
        Self { config, catalog }
    }

    /// Register an action that the planner can use.
    pub fn register_action(&mut self, action: Action) {
        self.catalog.push(action);
    }
}

impl<'a> Search<'a> {
    fn new(planner: &'a IdaStarPlanner, start: &PropositionSet, goal: &'a PropositionSet) -> Self {
        let h = planner.config.heuristic.estimate(start, goal);
        let root = SearchNode {
            state: start.clone(),
            state_hash: start.content_hash(),
            action: None,
            id: 0,
            parent: None,
            g: 0,
            h,
            f: u64::from(h),
        };

        Self {
            planner,
            goal,
            path: vec![root],
            iterations: 0,
            expansions: 0,
            bounds: Vec::new(),
            started: Instant::now(),
        }
    }

    fn aborted(&self, limit: SearchLimit) -> GoapError {
        warn!(
            "IDA* aborted: {} limit hit after {} iterations, {} expansions",
            limit, self.iterations, self.expansions
        );
        GoapError::SearchAborted {
            limit,
            iterations: self.iterations,
            expansions: self.expansions,
        }
    }

    fn check_limits(&self) -> Result<()> {
        let config = &self.planner.config;
        if let Some(max) = config.max_expansions {
            if self.expansions >= max {
                return Err(self.aborted(SearchLimit::Expansions));
            }
        }
        if let Some(max_ms) = config.max_planning_time_ms {
            if self.started.elapsed().as_millis() as u64 > max_ms {
                return Err(self.aborted(SearchLimit::PlanningTime));
            }
        }
        Ok(())
    }

    /// Run bounded passes with a growing bound until the goal is found or
    /// nothing is left to try.
    fn run(mut self) -> Result<Plan> {
        let mut bound = self.path[0].f;
        debug!("Heuristic estimate: {}", bound);

        loop {
            self.iterations += 1;
            if let Some(max) = self.planner.config.max_iterations {
                if self.iterations > max {
                    return Err(self.aborted(SearchLimit::BoundGrowth));
                }
            }

            debug!("Iteration {} with bound {}", self.iterations, bound);
            self.bounds.push(bound);
            match self.probe(bound)? {
                Probe::Found => return Ok(self.reconstruct(bound)),
                Probe::Exceeded(next) => bound = next,
                Probe::Exhausted => {
                    return Err(GoapError::NoPlanFound {
                        iterations: self.iterations,
                        expansions: self.expansions,
                    })
                }
            }
        }
    }

    /// Bounded depth-first search below the last node of the path.
    fn probe(&mut self, bound: u64) -> Result<Probe> {
        let index = self.path.len() - 1;
        let node = &self.path[index];
        trace!(
            "Current node {} - g: {}, h: {}, f: {}",
            node.action.map_or("<start>", |a| a.name.as_str()),
            node.g,
            node.h,
            node.f
        );

        if node.f > bound {
            return Ok(Probe::Exceeded(node.f));
        }

        if node.state.meets_goal(self.goal) {
            trace!("Goal met");
            return Ok(Probe::Found);
        }

        self.check_limits()?;
        self.expansions += 1;

        let children = self.expand(index);
        trace!("Available nodes: {}", children.len());

        let mut min_exceeded: Option<u64> = None;
        for child in children {
            if self.on_path(&child) {
                continue;
            }

            self.path.push(child);
            match self.probe(bound)? {
                Probe::Found => return Ok(Probe::Found),
                Probe::Exceeded(f) => {
                    min_exceeded = Some(min_exceeded.map_or(f, |min| min.min(f)));
                }
                Probe::Exhausted => {}
            }
            self.path.pop();
        }

        Ok(min_exceeded.map_or(Probe::Exhausted, Probe::Exceeded))
    }

    /// One child per operable action, in catalog order, skipping no-ops.
    fn expand(&self, index: usize) -> Vec<SearchNode<'a>> {
        let planner: &'a IdaStarPlanner = self.planner;
        let current = &self.path[index];
        let mut children = Vec::new();

        for action in planner.catalog.iter() {
            if !action.operable_on(&current.state) {
                trace!("Potential action rejected: {}", action.name);
                continue;
            }

            let state = action.act_on(&current.state);
            let state_hash = state.content_hash();
            if state_hash == current.state_hash && state == current.state {
                trace!("Potential action has no effect: {}", action.name);
                continue;
            }

            trace!("Potential action accepted: {}", action.name);
            let g = current.g + u64::from(action.cost);
            let h = planner.config.heuristic.estimate(&state, self.goal);
            children.push(SearchNode {
                state,
                state_hash,
                action: Some(action),
                id: index + 1,
                parent: Some(current.id),
                g,
                h,
                f: g + u64::from(h),
            });
        }

        children
    }

    fn on_path(&self, candidate: &SearchNode<'_>) -> bool {
        match self.planner.config.search_mode {
            SearchMode::UniqueActions => {
                let Some(action) = candidate.action else {
                    return false;
                };
                self.path
                    .iter()
                    .any(|node| node.action.is_some_and(|a| a.name == action.name))
            }
            SearchMode::UniqueStates => self.path.iter().any(|node| node.same_state(candidate)),
        }
    }

    /// Walk parent links back from the goal node, prepending each step.
    fn reconstruct(self, bound: u64) -> Plan {
        let mut plan = Plan::new().with_catalog_fingerprint(self.planner.catalog.fingerprint());

        let mut cursor = self.path.last().map(|node| node.id);
        while let Some(id) = cursor {
            let node = &self.path[id];
            if let Some(action) = node.action {
                plan.insert(
                    0,
                    PlanStep {
                        action: action.clone(),
                        state: node.state.clone(),
                        g: node.g,
                        h: node.h,
                        f: node.f,
                    },
                );
            }
            cursor = node.parent;
        }

        plan.stats = SearchStats {
            iterations: self.iterations,
            expansions: self.expansions,
            bounds: self.bounds,
            final_bound: bound,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        };
        plan
    }
}

impl Planner for IdaStarPlanner {
    fn find_plan(&self, start: &PropositionSet, goal: &PropositionSet) -> Result<Plan> {
        info!(
            "Starting IDA* planning over {} actions for {} goal propositions",
            self.catalog.len(),
            goal.len()
        );

        let result = Search::new(self, start, goal).run();
        match &result {
            Ok(plan) => info!(
                "IDA* found plan with {} steps (cost {}), {} iterations, {} expansions in {}ms",
                plan.len(),
                plan.total_cost(),
                plan.stats.iterations,
                plan.stats.expansions,
                plan.stats.elapsed_ms
            ),
            Err(e) => info!("IDA* planning failed: {}", e),
        }
        result
    }

    fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn set_config(&mut self, config: PlannerConfig) {
        self.config = config;
    }
}
