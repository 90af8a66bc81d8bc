//! Pipeline data model.
//!
//! A [`Pipeline`] is an ordered collection of [`Asset`]s addressable by name.
//! Lookups are case-sensitive first with a case-insensitive fallback, since
//! SQL identifiers are folded inconsistently across warehouses. Stored names
//! are never rewritten; only the lookup key is folded.

mod asset;
mod column;

pub use asset::{Asset, AssetType, DependsColumn, Upstream, UpstreamKind};
pub use column::{Column, ColumnCheck, EntityAttribute, UpstreamColumn};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading or saving a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read pipeline file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse pipeline: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Serialized shape of a pipeline; the name index is rebuilt on load.
#[derive(Deserialize)]
struct RawPipeline {
    #[serde(default)]
    name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

impl From<RawPipeline> for Pipeline {
    fn from(raw: RawPipeline) -> Self {
        Pipeline::new(raw.name, raw.assets)
    }
}

/// An in-memory pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawPipeline")]
pub struct Pipeline {
    pub name: String,
    assets: Vec<Asset>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
    /// Lower-cased name -> first asset with that folded name
    #[serde(skip)]
    by_folded_name: HashMap<String, usize>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, assets: Vec<Asset>) -> Self {
        let mut pipeline = Self {
            name: name.into(),
            assets: Vec::with_capacity(assets.len()),
            by_name: HashMap::new(),
            by_folded_name: HashMap::new(),
        };
        for asset in assets {
            pipeline.push_asset(asset);
        }
        pipeline
    }

    pub fn push_asset(&mut self, asset: Asset) {
        let idx = self.assets.len();
        self.by_name.entry(asset.name().to_string()).or_insert(idx);
        self.by_folded_name
            .entry(asset.name().to_lowercase())
            .or_insert(idx);
        self.assets.push(asset);
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Asset> {
        self.assets.get(idx)
    }

    /// Mutable access by index. [`Asset::name`] has no setter, so edits made
    /// here never invalidate the name index.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Asset> {
        self.assets.get_mut(idx)
    }

    // =========================================================================
    // Index lookups
    // =========================================================================

    /// Exact-name lookup.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Case-insensitive lookup.
    pub fn position_ci(&self, name: &str) -> Option<usize> {
        self.by_folded_name.get(&name.to_lowercase()).copied()
    }

    /// Exact lookup with case-insensitive fallback.
    pub fn find_position(&self, name: &str) -> Option<usize> {
        self.position(name).or_else(|| self.position_ci(name))
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.position(name).map(|idx| &self.assets[idx])
    }

    pub fn asset_ci(&self, name: &str) -> Option<&Asset> {
        self.position_ci(name).map(|idx| &self.assets[idx])
    }

    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.find_position(name).map(|idx| &self.assets[idx])
    }

    pub fn find_asset_mut(&mut self, name: &str) -> Option<&mut Asset> {
        let idx = self.find_position(name)?;
        self.assets.get_mut(idx)
    }

    // =========================================================================
    // IO
    // =========================================================================

    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Blank every asset's SQL body.
    pub fn wipe_sql(&mut self) {
        for asset in &mut self.assets {
            asset.sql.clear();
        }
    }
}
