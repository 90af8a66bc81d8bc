//! Lineage errors and the per-walk issue report.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::analyzer::AnalyzerError;
use crate::render::RenderError;

/// Why a single asset's lineage could not be resolved.
#[derive(Debug, Error)]
pub enum LineageError {
    #[error("upstream asset not found: {0}")]
    UpstreamNotFound(String),

    #[error("failed to render the query: {0}")]
    Render(#[from] RenderError),

    #[error("failed to parse column lineage: {0}")]
    Analyzer(#[from] AnalyzerError),

    /// Problems reported by the analyzer itself.
    #[error("failed to parse column lineage: {}", .0.join(", "))]
    Syntax(Vec<String>),

    /// Internal contract violation, e.g. an unnamed column from the analyzer.
    #[error("invalid arguments: {0}")]
    InvalidArguments(&'static str),
}

/// One asset that failed lineage resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageIssue {
    pub asset: String,
    pub description: String,
    /// Raw (un-rendered) SQL of the asset
    pub context: Vec<String>,
}

impl LineageIssue {
    pub fn new(asset: impl Into<String>, error: &LineageError, sql: &str) -> Self {
        Self {
            asset: asset.into(),
            description: error.to_string(),
            context: vec![sql.to_string()],
        }
    }
}

/// Every issue collected during one walk, in the order they were hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineageReport {
    issues: Vec<LineageIssue>,
}

impl LineageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: LineageIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: LineageReport) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[LineageIssue] {
        &self.issues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineageIssue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues raised for the named asset (case-insensitive).
    pub fn for_asset<'a>(&'a self, asset: &'a str) -> impl Iterator<Item = &'a LineageIssue> {
        self.issues
            .iter()
            .filter(move |i| i.asset.eq_ignore_ascii_case(asset))
    }
}

impl IntoIterator for LineageReport {
    type Item = LineageIssue;
    type IntoIter = std::vec::IntoIter<LineageIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl fmt::Display for LineageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{}: {}", issue.asset, issue.description)?;
        }
        Ok(())
    }
}
