//! Read-only graph views over a pipeline.
//!
//! - [`AssetGraph`] - which assets depend on which (direct, transitive, cycles)
//! - [`ColumnLineageGraph`] - which columns derive from which, for impact analysis
//!
//! Both are built after lineage resolution and never feed back into it.

mod asset_graph;
mod column_graph;

pub use asset_graph::{AssetGraph, DependencyCycleError};
pub use column_graph::{ColumnLineageGraph, ColumnRef};
