//! # GOAP State
//!
//! Where planners get their inputs from.
//!
//! - [`WorldStateProvider`] and the versioned [`InMemoryWorld`]
//! - [`WorldSubscription`] for watching world changes
//! - [`ActionCatalogLoader`] and the JSON row formats for actions and worlds

pub mod loader;
pub mod snapshot;
pub mod subscription;
pub mod world;

pub use loader::{
    catalog_from_rows, load_world_rows, parse_action_rows, parse_world_rows, state_from_rows,
    ActionCatalogLoader, ActionRow, JsonCatalogLoader, StaticCatalogLoader, WorldRow,
};
pub use snapshot::WorldSnapshot;
pub use subscription::{ChangeFilter, ChangeType, WorldChange, WorldSubscription};
pub use world::{InMemoryWorld, WorldEntry, WorldStateProvider};
