//! # Sluice
//!
//! Column-level lineage for SQL data pipelines.
//!
//! ## Architecture
//!
//! A pipeline is a graph of assets (SQL queries, scripts, seeds). Sluice
//! works out which columns each SQL asset produces and where every one of
//! them comes from, carrying types, descriptions and provenance across
//! arbitrarily long dependency chains:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                Pipeline (JSON, in memory)                │
//! │         assets, columns, upstreams, raw SQL              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lineage::LineageExtractor]
//! ┌─────────────────────────────────────────────────────────┐
//! │     per asset, upstream first:                           │
//! │     schema hint → render → analyze → merge → reconcile   │
//! └─────────────────────────────────────────────────────────┘
//!             │                              ▲
//!             ▼ [LineageAnalyzer]            │ LineageResult
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  cache::CachedAnalyzer   │──▶│  worker::WorkerAnalyzer  │
//! │  (SQLite, optional)      │   │  (NDJSON child process)  │
//! └──────────────────────────┘   └──────────────────────────┘
//!                          │
//!                          ▼ [graph]
//! ┌─────────────────────────────────────────────────────────┐
//! │      AssetGraph / ColumnLineageGraph (read-only views)   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod graph;
pub mod lineage;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod sql;
pub mod worker;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::dialect::{Dialect, DialectLookup};
    pub use crate::lineage::{
        LineageAnalyzer, LineageExtractor, LineageIssue, LineageReport, LineageResult, Schema,
    };
    pub use crate::pipeline::{Asset, Column, Pipeline, Upstream, UpstreamColumn};
    pub use crate::render::{QueryRenderer, TemplateRenderer};
}
