//! Schema projection.
//!
//! The analyzer resolves `SELECT *` and unqualified columns much better when
//! it is told what the referenced tables look like. A [`Schema`] is a
//! throwaway `table -> column -> type` hint built from whatever the pipeline
//! already knows, rebuilt before every statement so it reflects the latest
//! upstream resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Asset, Column, Pipeline};

/// `table -> (column -> type)` hint passed to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, BTreeMap<String, String>>);

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: impl Into<String>, columns: BTreeMap<String, String>) {
        self.0.insert(table.into(), columns);
    }

    pub fn table(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(name)
    }

    /// Case-insensitive table lookup.
    pub fn table_ci(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.0
            .iter()
            .find(|(table, _)| table.eq_ignore_ascii_case(name))
            .map(|(_, columns)| columns)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn add_asset(&mut self, asset: &Asset) {
        if !asset.columns.is_empty() {
            self.insert_table(asset.name().to_string(), column_map(&asset.columns));
        }
    }
}

/// Schema of every asset that already has known columns.
pub fn project_all(pipeline: &Pipeline) -> Schema {
    let mut schema = Schema::new();
    for asset in pipeline.assets() {
        schema.add_asset(asset);
    }
    schema
}

/// Schema restricted to the direct asset upstreams of `asset`.
///
/// URI upstreams and upstreams that don't resolve contribute nothing.
pub fn project_upstreams_of(pipeline: &Pipeline, asset: &Asset) -> Schema {
    let mut schema = Schema::new();
    for upstream in asset.asset_upstreams() {
        if let Some(upstream_asset) = pipeline.find_asset(&upstream.value) {
            schema.add_asset(upstream_asset);
        }
    }
    schema
}

fn column_map(columns: &[Column]) -> BTreeMap<String, String> {
    columns
        .iter()
        .filter(|c| !c.name.is_empty())
        .map(|c| (c.name.clone(), c.data_type.clone()))
        .collect()
}
