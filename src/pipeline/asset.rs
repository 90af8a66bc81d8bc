// src/pipeline/asset.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::column::Column;

/// Asset type string as declared in the pipeline (e.g. `bq.sql`, `python`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetType(pub String);

impl AssetType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an upstream points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamKind {
    /// Another asset in the same pipeline
    #[default]
    Asset,
    /// An external source (raw table, bucket, etc.)
    Uri,
}

/// A source column an asset reads from one of its upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependsColumn {
    pub name: String,
    #[serde(default)]
    pub usage: String,
}

impl DependsColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
        }
    }
}

/// A declared dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Upstream {
    #[serde(rename = "type", default)]
    pub kind: UpstreamKind,
    pub value: String,
    #[serde(default)]
    pub columns: Vec<DependsColumn>,
}

impl Upstream {
    pub fn asset(name: impl Into<String>) -> Self {
        Self {
            kind: UpstreamKind::Asset,
            value: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            kind: UpstreamKind::Uri,
            value: uri.into(),
            columns: Vec::new(),
        }
    }

    pub fn is_asset(&self) -> bool {
        self.kind == UpstreamKind::Asset
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One node of the pipeline graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Asset {
    /// Fixed once constructed; the pipeline indexes assets by name.
    name: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    /// Raw executable SQL, before template rendering
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
}

impl Asset {
    pub fn new(name: impl Into<String>, asset_type: impl Into<AssetType>) -> Self {
        Self {
            name: name.into(),
            asset_type: asset_type.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.upstreams.push(upstream);
        self
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Upstreams that point at other assets.
    pub fn asset_upstreams(&self) -> impl Iterator<Item = &Upstream> {
        self.upstreams.iter().filter(|u| u.is_asset())
    }
}
