//! World change subscriptions.

use chrono::{DateTime, Utc};
use goap_core::PropositionId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

/// A change to one proposition of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldChange {
    /// The proposition that changed.
    pub id: PropositionId,

    /// The new value (None if removed).
    pub new_value: Option<bool>,

    /// The previous value (None if it was unknown).
    pub old_value: Option<bool>,

    /// Type of change.
    pub change_type: ChangeType,

    /// World version after the change.
    pub version: u64,

    /// Timestamp of the change.
    pub timestamp: DateTime<Utc>,
}

/// Type of world change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Proposition became known.
    Created,
    /// Known proposition flipped value.
    Updated,
    /// Proposition became unknown.
    Removed,
}

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeFilter {
    /// Proposition id prefix to match, e.g. `"Fire."`.
    pub prefix: Option<String>,

    /// Specific propositions to watch.
    pub ids: Option<Vec<PropositionId>>,

    /// Change types to watch.
    pub change_types: Option<Vec<ChangeType>>,
}

impl ChangeFilter {
    /// Create a filter for an id prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    /// Create a filter for specific propositions, e.g. the keys of a goal.
    pub fn ids<I, K>(ids: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PropositionId>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Check if a change matches this filter.
    pub fn matches(&self, change: &WorldChange) -> bool {
        if let Some(ref prefix) = self.prefix {
            if !change.id.as_str().starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(ref ids) = self.ids {
            if !ids.contains(&change.id) {
                return false;
            }
        }

        if let Some(ref types) = self.change_types {
            if !types.contains(&change.change_type) {
                return false;
            }
        }

        true
    }
}

/// A subscription to world changes.
pub struct WorldSubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    /// Filter for this subscription.
    pub filter: ChangeFilter,

    receiver: broadcast::Receiver<WorldChange>,
}

impl WorldSubscription {
    pub(crate) fn new(filter: ChangeFilter, receiver: broadcast::Receiver<WorldChange>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filter,
            receiver,
        }
    }

    /// Wait for the next matching change. Returns `None` once the world is dropped.
    pub async fn recv(&mut self) -> Option<WorldChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscription {} lagged, skipped {} changes", self.id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream of matching changes.
    pub fn into_stream(self) -> impl Stream<Item = WorldChange> {
        let filter = self.filter;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(change) if filter.matches(&change) => Some(change),
            _ => None,
        })
    }
}
