//! The ordered list of actions a planner searches over.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::action::Action;
use crate::error::{GoapError, Result};
use crate::plan::{simulate, Plan};
use crate::proposition::PropositionSet;

/// An ordered, immutable-during-search list of actions.
///
/// Order matters: the planner expands actions in catalog order, which decides
/// which of several equally good plans is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionCatalog {
    actions: Vec<Action>,
    fingerprint: String,
}

impl ActionCatalog {
    /// Create a catalog from actions, keeping their order.
    pub fn new(actions: Vec<Action>) -> Self {
        let fingerprint = compute_fingerprint(&actions);
        Self {
            actions,
            fingerprint,
        }
    }

    /// Append an action.
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
        self.fingerprint = compute_fingerprint(&self.actions);
    }

    /// Actions in catalog order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Iterate over the actions in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// First action with the given name.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Names that appear more than once, in first-repeat order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for action in &self.actions {
            let name = action.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Hex SHA-256 of the catalog's canonical JSON form.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Simulate `plan` from `start`, after checking this catalog produced it.
    ///
    /// Fails with [`GoapError::IncompatibleCatalog`] if the plan records a
    /// different catalog fingerprint, or if any step uses an action this
    /// catalog does not contain.
    pub fn replay(&self, start: &PropositionSet, plan: &Plan) -> Result<PropositionSet> {
        if let Some(ref fingerprint) = plan.catalog_fingerprint {
            if fingerprint != &self.fingerprint {
                return Err(GoapError::IncompatibleCatalog {
                    message: format!(
                        "plan {} was built from catalog {}, not {}",
                        plan.id, fingerprint, self.fingerprint
                    ),
                });
            }
        }

        for step in &plan.steps {
            if !self.actions.contains(&step.action) {
                return Err(GoapError::IncompatibleCatalog {
                    message: format!("unknown action '{}' in plan {}", step.action.name, plan.id),
                });
            }
        }

        Ok(simulate(start, plan))
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<Action>> for ActionCatalog {
    fn from(actions: Vec<Action>) -> Self {
        Self::new(actions)
    }
}

impl From<ActionCatalog> for Vec<Action> {
    fn from(catalog: ActionCatalog) -> Self {
        catalog.actions
    }
}

impl FromIterator<Action> for ActionCatalog {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ActionCatalog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

fn compute_fingerprint(actions: &[Action]) -> String {
    let json = serde_json::to_vec(actions).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
