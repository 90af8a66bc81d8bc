// src/pipeline/column.rs
use serde::{Deserialize, Serialize};

/// A provenance edge: the output column derives from `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamColumn {
    pub column: String,
    pub table: String,
}

impl UpstreamColumn {
    pub fn new(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            table: table.into(),
        }
    }

    /// Same (column, table) pair, ignoring case.
    pub fn same_source(&self, other: &UpstreamColumn) -> bool {
        self.column.eq_ignore_ascii_case(&other.column)
            && self.table.eq_ignore_ascii_case(&other.table)
    }
}

/// Domain-semantic tag carried by a column. Opaque to lineage resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAttribute {
    pub entity: String,
    pub attribute: String,
}

/// A validation rule declared on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCheck {
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
    #[serde(default = "default_true")]
    pub blocking: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_true() -> bool {
    true
}

/// A column produced by an asset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub entity_attribute: Option<EntityAttribute>,
    #[serde(default)]
    pub update_on_merge: bool,
    #[serde(default)]
    pub checks: Vec<ColumnCheck>,
    /// Provenance edges, deduplicated by (column, table) ignoring case
    #[serde(default)]
    pub upstreams: Vec<UpstreamColumn>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_upstream(mut self, column: impl Into<String>, table: impl Into<String>) -> Self {
        self.upstreams.push(UpstreamColumn::new(column, table));
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn has_upstream(&self, edge: &UpstreamColumn) -> bool {
        self.upstreams.iter().any(|existing| existing.same_source(edge))
    }

    /// Drop the asset-local declarations that must never cross a lineage edge.
    pub fn strip_constraints(&mut self) {
        self.primary_key = false;
        self.checks.clear();
    }
}
