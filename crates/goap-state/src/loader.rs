//! Action catalog and world loaders.
//!
//! Catalogs and worlds are authored as flat tables of rows elsewhere; this
//! module only turns already validated rows into planner types.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use goap_core::{Action, ActionCatalog, Cost, GoapError, PropositionId, PropositionSet, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One row of a world table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldRow {
    pub tag: PropositionId,
    pub flag: bool,
}

/// One row of an action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub name: String,

    /// Free-form metadata, never consulted by the search.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub cost: Cost,

    #[serde(default)]
    pub preconditions: PropositionSet,

    #[serde(default)]
    pub effects: PropositionSet,
}

impl TryFrom<ActionRow> for Action {
    type Error = GoapError;

    fn try_from(row: ActionRow) -> Result<Self> {
        row.tags
            .into_iter()
            .fold(Action::builder(row.name), |builder, tag| builder.tag(tag))
            .cost(row.cost)
            .preconditions(row.preconditions)
            .effects(row.effects)
            .build()
    }
}

/// Build a catalog from action rows, keeping row order.
pub fn catalog_from_rows(rows: Vec<ActionRow>) -> Result<ActionCatalog> {
    let actions = rows
        .into_iter()
        .map(Action::try_from)
        .collect::<Result<Vec<_>>>()?;
    let catalog = ActionCatalog::new(actions);

    let duplicates = catalog.duplicate_names();
    if !duplicates.is_empty() {
        warn!("Action catalog repeats names: {:?}", duplicates);
    }
    Ok(catalog)
}

/// Build a world state from world rows. Later rows win.
pub fn state_from_rows(rows: impl IntoIterator<Item = WorldRow>) -> PropositionSet {
    rows.into_iter().map(|row| (row.tag, row.flag)).collect()
}

/// Parse a JSON array of action rows.
pub fn parse_action_rows(json: &str) -> Result<ActionCatalog> {
    let rows: Vec<ActionRow> = serde_json::from_str(json)?;
    catalog_from_rows(rows)
}

/// Parse a JSON array of world rows.
pub fn parse_world_rows(json: &str) -> Result<PropositionSet> {
    let rows: Vec<WorldRow> = serde_json::from_str(json)?;
    Ok(state_from_rows(rows))
}

/// Read a JSON array of world rows from disk.
pub async fn load_world_rows(path: impl AsRef<Path>) -> Result<PropositionSet> {
    let path = path.as_ref();
    let text = read_source(path).await?;
    parse_world_rows(&text).map_err(|e| load_error(path, e))
}

/// Supplies the action catalog before any search runs.
#[async_trait]
pub trait ActionCatalogLoader: Send + Sync {
    async fn load(&self) -> Result<ActionCatalog>;
}

/// Loads a JSON array of action rows from a file.
#[derive(Debug, Clone)]
pub struct JsonCatalogLoader {
    path: PathBuf,
}

impl JsonCatalogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ActionCatalogLoader for JsonCatalogLoader {
    async fn load(&self) -> Result<ActionCatalog> {
        let text = read_source(&self.path).await?;
        let catalog = parse_action_rows(&text).map_err(|e| load_error(&self.path, e))?;
        info!(
            "Loaded {} actions from {} (fingerprint {})",
            catalog.len(),
            self.path.display(),
            catalog.fingerprint()
        );
        Ok(catalog)
    }
}

/// Hands out a catalog built in code.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogLoader {
    catalog: ActionCatalog,
}

impl StaticCatalogLoader {
    pub fn new(catalog: impl Into<ActionCatalog>) -> Self {
        Self {
            catalog: catalog.into(),
        }
    }
}

#[async_trait]
impl ActionCatalogLoader for StaticCatalogLoader {
    async fn load(&self) -> Result<ActionCatalog> {
        debug!("Static catalog with {} actions", self.catalog.len());
        Ok(self.catalog.clone())
    }
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| load_error(path, e))
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> GoapError {
    GoapError::LoadError {
        source_name: path.display().to_string(),
        message: err.to_string(),
    }
}
