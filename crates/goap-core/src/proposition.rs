//! Proposition sets: the world states, goals, preconditions and effects of the planner.
//!
//! A [`PropositionSet`] maps proposition ids to booleans. A proposition that is
//! absent is *unknown*, which is not the same as being present and `false`:
//! a goal of `{door_open: false}` is not met by a state that never mentions
//! `door_open`.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::types::PropositionId;

/// A set of boolean propositions.
///
/// Storage is ordered so that iteration, serialization and anything derived
/// from them is reproducible between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropositionSet {
    flags: BTreeMap<PropositionId, bool>,
}

impl PropositionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, id: impl Into<PropositionId>, value: bool) -> Self {
        self.set(id, value);
        self
    }

    /// Insert or overwrite a proposition, returning the previous value.
    pub fn set(&mut self, id: impl Into<PropositionId>, value: bool) -> Option<bool> {
        self.flags.insert(id.into(), value)
    }

    /// Value of a proposition, `None` if unknown.
    pub fn get(&self, id: &str) -> Option<bool> {
        self.flags.get(id).copied()
    }

    /// Forget a proposition, making it unknown again.
    pub fn remove(&mut self, id: &str) -> Option<bool> {
        self.flags.remove(id)
    }

    /// Whether the proposition is known (true or false).
    pub fn contains(&self, id: &str) -> bool {
        self.flags.contains_key(id)
    }

    /// Number of known propositions.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Iterate over `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropositionId, bool)> {
        self.flags.iter().map(|(id, value)| (id, *value))
    }

    /// True if every proposition of `goal` is present here with the same value.
    ///
    /// Propositions that only this set knows about are ignored, and an empty
    /// goal is always met.
    pub fn meets_goal(&self, goal: &PropositionSet) -> bool {
        goal.iter().all(|(id, wanted)| self.get(id.as_str()) == Some(wanted))
    }

    /// Number of goal propositions that are missing here or have the wrong value.
    pub fn calculate_heuristic(&self, goal: &PropositionSet) -> u32 {
        goal.iter()
            .filter(|(id, wanted)| self.get(id.as_str()) != Some(*wanted))
            .count() as u32
    }

    /// Distance estimate with the positional penalty of earlier planner versions.
    ///
    /// Same as [`calculate_heuristic`](Self::calculate_heuristic), except that
    /// a goal proposition which is present here counts as a mismatch whenever
    /// its position in goal order equals `self.len() - 1`, whatever its value.
    pub fn legacy_heuristic(&self, goal: &PropositionSet) -> u32 {
        let last = self.len().checked_sub(1);
        goal.iter()
            .enumerate()
            .filter(|(index, (id, wanted))| match self.get(id.as_str()) {
                Some(actual) => Some(*index) == last || actual != *wanted,
                None => true,
            })
            .count() as u32
    }

    /// A copy of this set with `effects` laid over it.
    pub fn overlay(&self, effects: &PropositionSet) -> PropositionSet {
        let mut next = self.clone();
        next.apply_effects(effects);
        next
    }

    /// Insert or overwrite every proposition of `effects`; other keys are untouched.
    pub fn apply_effects(&mut self, effects: &PropositionSet) {
        for (id, value) in effects.iter() {
            self.flags.insert(id.clone(), value);
        }
    }

    /// Order-independent hash of the set's content.
    ///
    /// Sets with equal content always hash equally. Unequal sets may collide,
    /// so callers that need certainty compare with `==` after a hash match.
    pub fn content_hash(&self) -> u64 {
        self.flags.iter().fold(0u64, |acc, pair| {
            let mut hasher = DefaultHasher::new();
            pair.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        })
    }
}

impl<K: Into<PropositionId>> FromIterator<(K, bool)> for PropositionSet {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(|(id, value)| (id.into(), value)).collect(),
        }
    }
}

impl<K: Into<PropositionId>> Extend<(K, bool)> for PropositionSet {
    fn extend<I: IntoIterator<Item = (K, bool)>>(&mut self, iter: I) {
        for (id, value) in iter {
            self.set(id, value);
        }
    }
}
