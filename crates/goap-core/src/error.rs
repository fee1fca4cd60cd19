//! Error types for the GOAP planner.

use thiserror::Error;

/// Main error type for GOAP operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GoapError {
    /// Every bound was exhausted without satisfying the goal.
    #[error("No plan found after {iterations} iterations ({expansions} nodes expanded)")]
    NoPlanFound { iterations: usize, expansions: usize },

    /// A configured search limit was hit before the search finished.
    #[error("search aborted: exceeded {limit} limit after {iterations} iterations ({expansions} nodes expanded)")]
    SearchAborted {
        limit: SearchLimit,
        iterations: usize,
        expansions: usize,
    },

    /// An action definition was rejected.
    #[error("Invalid action: {message}")]
    InvalidAction { message: String },

    /// A plan was replayed against a catalog that did not produce it.
    #[error("Plan is incompatible with the action catalog: {message}")]
    IncompatibleCatalog { message: String },

    /// A search is already running on this planner.
    #[error("A planning run is already in flight")]
    PlanInFlight,

    /// Loading an action catalog or world table failed.
    #[error("Failed to load {source_name}: {message}")]
    LoadError { source_name: String, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Search limits that can abort a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// Too many bound increases.
    BoundGrowth,
    /// Too many node expansions.
    Expansions,
    /// Wall-clock planning budget.
    PlanningTime,
}

impl std::fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchLimit::BoundGrowth => write!(f, "bound-growth"),
            SearchLimit::Expansions => write!(f, "expansion"),
            SearchLimit::PlanningTime => write!(f, "planning-time"),
        }
    }
}

impl GoapError {
    /// Returns true if the search ran to completion and found nothing.
    pub fn is_no_plan(&self) -> bool {
        matches!(self, GoapError::NoPlanFound { .. })
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GoapError::PlanInFlight => true,
            GoapError::SearchAborted { limit, .. } => *limit == SearchLimit::PlanningTime,
            GoapError::LoadError { .. } => true,
            _ => false,
        }
    }
}

/// Convenience Result type for GOAP operations.
pub type Result<T> = std::result::Result<T, GoapError>;

impl From<serde_json::Error> for GoapError {
    fn from(err: serde_json::Error) -> Self {
        GoapError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_message_names_limit() {
        let err = GoapError::SearchAborted {
            limit: SearchLimit::BoundGrowth,
            iterations: 3,
            expansions: 10,
        };
        assert!(err.to_string().starts_with("search aborted: exceeded bound-growth limit"));
    }

    #[test]
    fn test_error_classification() {
        let none = GoapError::NoPlanFound {
            iterations: 1,
            expansions: 0,
        };
        assert!(none.is_no_plan());
        assert!(!none.is_recoverable());
        assert!(GoapError::PlanInFlight.is_recoverable());
    }

    #[test]
    fn test_recoverable_variants() {
        // No wildcard: a new variant has to be classified here.
        fn expected(err: &GoapError) -> bool {
            match err {
                GoapError::NoPlanFound { .. } => false,
                GoapError::SearchAborted { limit, .. } => *limit == SearchLimit::PlanningTime,
                GoapError::InvalidAction { .. } => false,
                GoapError::IncompatibleCatalog { .. } => false,
                GoapError::PlanInFlight => true,
                GoapError::LoadError { .. } => true,
                GoapError::SerializationError(_) => false,
                GoapError::Internal(_) => false,
            }
        }

        let errors = [
            GoapError::SearchAborted {
                limit: SearchLimit::PlanningTime,
                iterations: 2,
                expansions: 9,
            },
            GoapError::SearchAborted {
                limit: SearchLimit::Expansions,
                iterations: 2,
                expansions: 9,
            },
            GoapError::InvalidAction {
                message: "Action name cannot be empty".to_string(),
            },
            GoapError::LoadError {
                source_name: "actions.json".to_string(),
                message: "not found".to_string(),
            },
            GoapError::Internal("join failed".to_string()),
        ];
        for err in &errors {
            assert_eq!(err.is_recoverable(), expected(err), "{err}");
        }
    }
}
