//! World-state providers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goap_core::{PropositionId, PropositionSet, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::snapshot::WorldSnapshot;
use crate::subscription::{ChangeFilter, ChangeType, WorldChange, WorldSubscription};

/// A versioned proposition entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEntry {
    /// The proposition.
    pub id: PropositionId,

    /// Its current value.
    pub value: bool,

    /// World version at which the value was last written.
    pub version: u64,

    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

/// Supplies the world state a planner starts from.
#[async_trait]
pub trait WorldStateProvider: Send + Sync {
    /// Snapshot of the current world.
    async fn snapshot(&self) -> Result<WorldSnapshot>;

    /// The propositions currently known.
    async fn current(&self) -> Result<PropositionSet> {
        Ok(self.snapshot().await?.into_state())
    }
}

#[derive(Debug, Default)]
struct WorldInner {
    entries: BTreeMap<PropositionId, WorldEntry>,
    version: u64,
}

/// In-memory world shared between the code that senses the world and the
/// planners that read it.
pub struct InMemoryWorld {
    inner: RwLock<WorldInner>,

    /// Sender for broadcasting changes.
    changes: broadcast::Sender<WorldChange>,
}

impl InMemoryWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::with_inner(WorldInner::default())
    }

    /// Create a world holding `state` at version 0.
    pub fn from_state(state: &PropositionSet) -> Self {
        let now = Utc::now();
        let entries = state
            .iter()
            .map(|(id, value)| {
                let entry = WorldEntry {
                    id: id.clone(),
                    value,
                    version: 0,
                    updated_at: now,
                };
                (id.clone(), entry)
            })
            .collect();

        Self::with_inner(WorldInner {
            entries,
            version: 0,
        })
    }

    fn with_inner(inner: WorldInner) -> Self {
        let (changes, _) = broadcast::channel(1000);
        Self {
            inner: RwLock::new(inner),
            changes,
        }
    }

    /// Get the current entry for a proposition.
    pub async fn get(&self, id: &str) -> Option<WorldEntry> {
        self.inner.read().await.entries.get(id).cloned()
    }

    /// Set a proposition. Writing the value it already has is a no-op.
    pub async fn set(&self, id: impl Into<PropositionId>, value: bool) -> WorldEntry {
        let id = id.into();
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.entries.get(&id) {
            if existing.value == value {
                return existing.clone();
            }
        }

        inner.version += 1;
        let version = inner.version;
        let entry = WorldEntry {
            id: id.clone(),
            value,
            version,
            updated_at: Utc::now(),
        };
        let old = inner.entries.insert(id, entry.clone());
        self.publish(&entry.id, old.map(|e| e.value), Some(value), version);
        entry
    }

    /// Forget a proposition, making it unknown.
    pub async fn remove(&self, id: &str) -> Option<WorldEntry> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.remove(id)?;
        inner.version += 1;
        let version = inner.version;
        self.publish(&removed.id, Some(removed.value), None, version);
        Some(removed)
    }

    /// Lay a set of effects over the world, e.g. after executing a plan step.
    ///
    /// All effects land under one write and share a single version bump, so
    /// readers never see them half applied. Returns the world version
    /// afterwards.
    pub async fn apply_effects(&self, effects: &PropositionSet) -> u64 {
        let mut inner = self.inner.write().await;
        let changed: Vec<(PropositionId, bool)> = effects
            .iter()
            .filter(|(id, value)| inner.entries.get(*id).map(|e| e.value) != Some(*value))
            .map(|(id, value)| (id.clone(), value))
            .collect();
        if changed.is_empty() {
            return inner.version;
        }

        inner.version += 1;
        let version = inner.version;
        let now = Utc::now();
        for (id, value) in changed {
            let entry = WorldEntry {
                id: id.clone(),
                value,
                version,
                updated_at: now,
            };
            let old = inner.entries.insert(id.clone(), entry);
            self.publish(&id, old.map(|e| e.value), Some(value), version);
        }
        version
    }

    /// Get the current version of the world.
    pub async fn version(&self) -> u64 {
        self.inner.read().await.version
    }

    /// Subscribe to changes matching `filter`.
    pub fn subscribe(&self, filter: ChangeFilter) -> WorldSubscription {
        WorldSubscription::new(filter, self.changes.subscribe())
    }

    fn publish(&self, id: &PropositionId, old_value: Option<bool>, new_value: Option<bool>, version: u64) {
        let change_type = match (old_value, new_value) {
            (None, Some(_)) => ChangeType::Created,
            (Some(_), None) => ChangeType::Removed,
            _ => ChangeType::Updated,
        };
        debug!("World v{}: {} {:?} -> {:?}", version, id, old_value, new_value);

        // Nobody listening is fine.
        let _ = self.changes.send(WorldChange {
            id: id.clone(),
            new_value,
            old_value,
            change_type,
            version,
            timestamp: Utc::now(),
        });
    }
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorldStateProvider for InMemoryWorld {
    async fn snapshot(&self) -> Result<WorldSnapshot> {
        let inner = self.inner.read().await;
        let state = inner
            .entries
            .values()
            .map(|entry| (entry.id.clone(), entry.value))
            .collect();

        Ok(WorldSnapshot {
            id: Uuid::new_v4(),
            version: inner.version,
            timestamp: Utc::now(),
            state,
        })
    }
}
