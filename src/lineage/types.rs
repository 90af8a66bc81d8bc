//! Analyzer result types.
//!
//! These mirror the JSON emitted by the SQL analyzer for a single statement.

use serde::{Deserialize, Serialize};

/// Output column name the analyzer uses for `SELECT *` it could not expand.
pub const WILDCARD: &str = "*";

/// A source column referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceColumn {
    pub column: String,
    pub table: String,
}

impl SourceColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            table: table.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.column == WILDCARD
    }
}

/// Lineage of one column of the statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub upstream: Vec<SourceColumn>,
}

impl ColumnLineage {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            upstream: Vec::new(),
        }
    }

    pub fn from_source(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.upstream.push(SourceColumn::new(table, column));
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

/// Column lineage for one SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineageResult {
    /// Output columns, in select-list order
    #[serde(default)]
    pub columns: Vec<ColumnLineage>,
    /// Columns read only by WHERE / GROUP BY / ORDER BY / JOIN conditions
    #[serde(default)]
    pub non_selected_columns: Vec<ColumnLineage>,
    /// Analyzer-reported problems; non-empty means the call failed
    #[serde(default)]
    pub errors: Vec<String>,
}

impl LineageResult {
    pub fn with_columns(columns: Vec<ColumnLineage>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
