//! Scenario files for the demo runner.

use std::path::Path;
use std::sync::Arc;

use goap_core::{GoapError, PropositionSet, Result};
use goap_planner::{IdaStarPlanner, PlannerConfig};
use goap_state::{catalog_from_rows, state_from_rows, ActionRow, InMemoryWorld, WorldRow};
use serde::{Deserialize, Serialize};

use crate::agent::PlanningAgent;

/// A world, an action table and a goal, read from one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: PlannerConfig,

    #[serde(default)]
    pub world: Vec<WorldRow>,

    pub actions: Vec<ActionRow>,

    pub goal: PropositionSet,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a scenario from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| GoapError::LoadError {
            source_name: path.display().to_string(),
            message,
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        Self::from_json(&text).map_err(|e| load_error(e.to_string()))
    }

    /// The starting world described by the scenario.
    pub fn initial_state(&self) -> PropositionSet {
        state_from_rows(self.world.iter().cloned())
    }

    pub fn planner(&self) -> Result<IdaStarPlanner> {
        let catalog = catalog_from_rows(self.actions.clone())?;
        Ok(IdaStarPlanner::with_config(catalog, self.config.clone()))
    }

    /// Build an agent over a fresh in-memory world seeded from the scenario.
    /// The world is returned too so the caller can carry out the plan.
    pub fn agent(&self) -> Result<(PlanningAgent, Arc<InMemoryWorld>)> {
        let world = Arc::new(InMemoryWorld::from_state(&self.initial_state()));
        let agent = PlanningAgent::new(Arc::new(self.planner()?), world.clone());
        Ok((agent, world))
    }
}
