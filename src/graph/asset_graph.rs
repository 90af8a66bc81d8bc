//! Asset dependency graph.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::pipeline::Pipeline;

/// Error returned when the pipeline's dependencies contain cycles.
#[derive(Debug, Clone)]
pub struct DependencyCycleError {
    /// Each cycle as the list of asset names in it
    pub cycles: Vec<Vec<String>>,
}

impl std::fmt::Display for DependencyCycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Circular dependencies detected between assets:")?;
        for (i, cycle) in self.cycles.iter().enumerate() {
            writeln!(f, "  Cycle {}: {} → (back to start)", i + 1, cycle.join(" → "))?;
        }
        Ok(())
    }
}

impl std::error::Error for DependencyCycleError {}

/// Asset-level dependency graph. Edges point from upstream to downstream.
#[derive(Debug, Default)]
pub struct AssetGraph {
    graph: DiGraph<String, ()>,
    /// Pipeline position -> node (same order)
    by_position: Vec<NodeIndex>,
    /// Lower-cased name -> node
    by_name: HashMap<String, NodeIndex>,
}

impl AssetGraph {
    /// Build the graph from every resolvable `asset` upstream.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut graph = Self::default();
        for asset in pipeline.assets() {
            let idx = graph.graph.add_node(asset.name().to_string());
            graph.by_position.push(idx);
            graph.by_name.entry(asset.name().to_lowercase()).or_insert(idx);
        }

        for (pos, asset) in pipeline.assets().iter().enumerate() {
            let downstream = graph.by_position[pos];
            for upstream in asset.asset_upstreams() {
                let Some(up_pos) = pipeline.find_position(&upstream.value) else {
                    continue;
                };
                let up = graph.by_position[up_pos];
                if graph.graph.find_edge(up, downstream).is_none() {
                    graph.graph.add_edge(up, downstream, ());
                }
            }
        }
        graph
    }

    fn node(&self, name: &str) -> Option<NodeIndex> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub fn asset_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Assets `name` reads from directly.
    pub fn direct_upstream(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Assets that read `name` directly.
    pub fn direct_downstream(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Everything `name` depends on, transitively.
    pub fn all_upstream(&self, name: &str) -> Vec<String> {
        self.reachable(name, Direction::Incoming)
    }

    /// Everything depending on `name`, transitively.
    pub fn all_downstream(&self, name: &str) -> Vec<String> {
        self.reachable(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.node(name) else {
            return vec![];
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn reachable(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(start) = self.node(name) else {
            return vec![];
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(idx, direction) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        let mut names: Vec<String> = visited.into_iter().map(|n| self.graph[n].clone()).collect();
        names.sort();
        names
    }

    /// Detect all dependency cycles.
    ///
    /// A single asset is only a cycle if it lists itself as an upstream.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                if scc.len() == 1 {
                    self.graph.find_edge(scc[0], scc[0]).is_some()
                } else {
                    true
                }
            })
            .map(|scc| scc.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .collect()
    }

    pub fn has_cycles(&self) -> bool {
        !self.detect_cycles().is_empty()
    }

    /// `Ok(())` when the pipeline is a DAG.
    pub fn validate_no_cycles(&self) -> Result<(), DependencyCycleError> {
        let cycles = self.detect_cycles();
        if cycles.is_empty() {
            Ok(())
        } else {
            Err(DependencyCycleError { cycles })
        }
    }
}
