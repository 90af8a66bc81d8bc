//! Column-level lineage graph.
//!
//! A read-only view over resolved `upstreams` edges, used for impact
//! analysis: which downstream columns are affected when a column changes.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;

/// A reference to a specific column in a specific asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub asset: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(asset: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            column: column.into(),
        }
    }

    /// Parse from "asset.column" format, splitting on the last dot so that
    /// schema-qualified asset names work.
    ///
    /// Returns None for invalid formats including empty asset or column.
    pub fn parse(s: &str) -> Option<Self> {
        let (asset, column) = s.rsplit_once('.')?;
        if asset.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self::new(asset, column))
    }

    fn folded(&self) -> (String, String) {
        (self.asset.to_lowercase(), self.column.to_lowercase())
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.asset, self.column)
    }
}

/// Column-level lineage graph.
///
/// Nodes are columns, edges point from a source column to the column
/// derived from it.
#[derive(Debug, Default)]
pub struct ColumnLineageGraph {
    graph: DiGraph<ColumnRef, ()>,
    /// Folded (asset, column) -> node
    node_index: HashMap<(String, String), NodeIndex>,
}

impl ColumnLineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every column's provenance edges.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut graph = Self::new();
        for asset in pipeline.assets() {
            for column in &asset.columns {
                let target = ColumnRef::new(asset.name(), column.name.clone());
                graph.get_or_create_node(target.clone());
                for edge in &column.upstreams {
                    graph.add_edge(
                        ColumnRef::new(edge.table.clone(), edge.column.clone()),
                        target.clone(),
                    );
                }
            }
        }
        graph
    }

    fn get_or_create_node(&mut self, col_ref: ColumnRef) -> NodeIndex {
        let key = col_ref.folded();
        if let Some(&idx) = self.node_index.get(&key) {
            idx
        } else {
            let idx = self.graph.add_node(col_ref);
            self.node_index.insert(key, idx);
            idx
        }
    }

    fn node(&self, col: &ColumnRef) -> Option<NodeIndex> {
        self.node_index.get(&col.folded()).copied()
    }

    /// Record that `to` is derived from `from`.
    /// Duplicate edges between the same pair are ignored.
    pub fn add_edge(&mut self, from: ColumnRef, to: ColumnRef) {
        let from_idx = self.get_or_create_node(from);
        let to_idx = self.get_or_create_node(to);

        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Columns this column is directly derived from.
    pub fn direct_dependencies(&self, col: &ColumnRef) -> Vec<ColumnRef> {
        self.neighbors(col, Direction::Incoming)
    }

    /// Columns directly derived from this column.
    pub fn direct_dependents(&self, col: &ColumnRef) -> Vec<ColumnRef> {
        self.neighbors(col, Direction::Outgoing)
    }

    fn neighbors(&self, col: &ColumnRef, direction: Direction) -> Vec<ColumnRef> {
        let Some(idx) = self.node(col) else {
            return vec![];
        };
        let mut out: Vec<ColumnRef> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        out.sort();
        out
    }

    /// Every column `col` is derived from, however indirectly.
    pub fn all_upstream(&self, col: &ColumnRef) -> HashSet<ColumnRef> {
        self.reachable(col, Direction::Incoming)
    }

    /// Every column derived from `col`, however indirectly.
    pub fn all_downstream(&self, col: &ColumnRef) -> HashSet<ColumnRef> {
        self.reachable(col, Direction::Outgoing)
    }

    fn reachable(&self, col: &ColumnRef, direction: Direction) -> HashSet<ColumnRef> {
        let Some(start_idx) = self.node(col) else {
            return HashSet::new();
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start_idx);

        while let Some(idx) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(idx, direction) {
                if let Some(col_ref) = self.graph.node_weight(neighbor) {
                    if visited.insert(col_ref.clone()) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        visited
    }

    /// Columns whose values change when `source_col` changes.
    pub fn impact_analysis(&self, source_col: &ColumnRef) -> HashSet<ColumnRef> {
        self.all_downstream(source_col)
    }

    /// Columns not derived from any other tracked column.
    pub fn source_columns(&self) -> Vec<ColumnRef> {
        let mut sources: Vec<ColumnRef> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect();
        sources.sort();
        sources
    }

    pub fn column_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
