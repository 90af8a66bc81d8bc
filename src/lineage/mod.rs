//! Column-level lineage resolution.
//!
//! Given a [`Pipeline`](crate::pipeline::Pipeline) and a SQL analyzer, the
//! engine works out, for every asset, which columns it produces and which
//! upstream asset and column each one derives from. Results are written back
//! into the pipeline in place.
//!
//! # Flow
//!
//! ```text
//! LineageExtractor (walker)        upstream-first, each asset once
//!        │
//!        ▼ per asset
//! project_upstreams_of (schema)    table -> column -> type hint
//!        │
//!        ▼
//! StatementAdapter (adapter)       dialect, render, analyze
//!        │
//!        ▼
//! merge_columns (merge)            create or fold output columns
//!        │
//!        ▼
//! reconcile_upstreams (reconcile)  record columns read per upstream
//! ```
//!
//! Failures are collected per asset into a [`LineageReport`]; one bad asset
//! never stops resolution of the others.

pub mod adapter;
pub mod analyzer;
mod error;
pub mod merge;
pub mod reconcile;
pub mod schema;
pub mod types;
mod walker;

pub use adapter::{Resolution, StatementAdapter};
pub use analyzer::{AnalyzerError, AnalyzerResult, LineageAnalyzer};
pub use error::{LineageError, LineageIssue, LineageReport};
pub use schema::{project_all, project_upstreams_of, Schema};
pub use types::{ColumnLineage, LineageResult, SourceColumn, WILDCARD};
pub use walker::{LineageExtractor, DEFAULT_RENDER_CONTEXT};
