//! Actions and the builder for creating them.
//!
//! An [`Action`] is a named, costed transformation: it can run when its
//! preconditions hold and, when it does, it lays its effects over the world.

use serde::{Deserialize, Serialize};

use crate::error::{GoapError, Result};
use crate::proposition::PropositionSet;
use crate::types::{Cost, PropositionId};

/// An action available to the planner. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Name of the action. Two actions with the same name are the same action
    /// as far as repeat detection is concerned.
    pub name: String,

    /// Cost of performing the action.
    pub cost: Cost,

    /// Propositions that must hold, with these values, before the action can run.
    #[serde(default)]
    pub preconditions: PropositionSet,

    /// Propositions set by the action.
    #[serde(default)]
    pub effects: PropositionSet,

    /// Free-form labels carried through from the catalog source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Action {
    /// Create a new ActionBuilder.
    pub fn builder(name: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(name)
    }

    /// True if every precondition is present in `state` with the matching value.
    pub fn operable_on(&self, state: &PropositionSet) -> bool {
        state.meets_goal(&self.preconditions)
    }

    /// The state produced by running this action on `state`.
    pub fn act_on(&self, state: &PropositionSet) -> PropositionSet {
        state.overlay(&self.effects)
    }
}

/// Builder for creating Actions with a fluent API.
#[derive(Debug, Default)]
pub struct ActionBuilder {
    name: String,
    cost: Cost,
    preconditions: PropositionSet,
    effects: PropositionSet,
    tags: Vec<String>,
}

impl ActionBuilder {
    /// Create a new ActionBuilder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the cost.
    pub fn cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    /// Require a proposition to have a value.
    pub fn precondition(mut self, id: impl Into<PropositionId>, value: bool) -> Self {
        self.preconditions.set(id, value);
        self
    }

    /// Replace all preconditions.
    pub fn preconditions(mut self, preconditions: PropositionSet) -> Self {
        self.preconditions = preconditions;
        self
    }

    /// Set a proposition when the action runs.
    pub fn effect(mut self, id: impl Into<PropositionId>, value: bool) -> Self {
        self.effects.set(id, value);
        self
    }

    /// Replace all effects.
    pub fn effects(mut self, effects: PropositionSet) -> Self {
        self.effects = effects;
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Build the Action.
    pub fn build(self) -> Result<Action> {
        if self.name.trim().is_empty() {
            return Err(GoapError::InvalidAction {
                message: "Action name cannot be empty".to_string(),
            });
        }

        Ok(Action {
            name: self.name,
            cost: self.cost,
            preconditions: self.preconditions,
            effects: self.effects,
            tags: self.tags,
        })
    }
}
