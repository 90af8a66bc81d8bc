#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;

use common::{fixed_renderer, FakeAnalyzer};
use pretty_assertions::assert_eq;
use sluice::graph::{AssetGraph, ColumnLineageGraph, ColumnRef};
use sluice::lineage::{ColumnLineage, LineageExtractor, LineageResult};
use sluice::pipeline::{Asset, Column, Pipeline, Upstream};

const STAGING_SQL: &str = "select id, amount * 100 as cents from raw.orders";
const MART_SQL: &str = "select id, cents, cents / 100.0 as amount from staging.orders";

fn pipeline() -> Pipeline {
    Pipeline::new(
        "orders",
        vec![
            Asset::new("mart.orders", "bq.sql")
                .with_sql(MART_SQL)
                .with_upstream(Upstream::asset("staging.orders")),
            Asset::new("staging.orders", "bq.sql")
                .with_sql(STAGING_SQL)
                .with_upstream(Upstream::asset("raw.orders")),
            Asset::new("raw.orders", "bq.seed")
                .with_column(Column::new("id", "int64"))
                .with_column(Column::new("amount", "float64")),
            Asset::new("audit.orders", "bq.sql").with_upstream(Upstream::asset("raw.orders")),
        ],
    )
}

async fn resolved() -> Pipeline {
    let analyzer = FakeAnalyzer::new()
        .reply(
            STAGING_SQL,
            LineageResult::with_columns(vec![
                ColumnLineage::new("id", "int64").from_source("raw.orders", "id"),
                ColumnLineage::new("cents", "int64").from_source("raw.orders", "amount"),
            ]),
        )
        .reply(
            MART_SQL,
            LineageResult::with_columns(vec![
                ColumnLineage::new("id", "int64").from_source("staging.orders", "id"),
                ColumnLineage::new("cents", "int64").from_source("staging.orders", "cents"),
                ColumnLineage::new("amount", "float64").from_source("staging.orders", "cents"),
            ]),
        );
    let extractor = LineageExtractor::new(analyzer).with_renderer(fixed_renderer());

    let mut pipeline = pipeline();
    extractor
        .column_lineage(&mut pipeline, "mart.orders", &mut HashSet::new())
        .await;
    pipeline
}

#[tokio::test]
async fn test_impact_of_a_source_column() {
    let graph = ColumnLineageGraph::from_pipeline(&resolved().await);

    let mut impacted: Vec<_> = graph
        .impact_analysis(&ColumnRef::new("raw.orders", "amount"))
        .into_iter()
        .collect();
    impacted.sort();

    assert_eq!(
        impacted,
        vec![
            ColumnRef::new("mart.orders", "amount"),
            ColumnRef::new("mart.orders", "cents"),
            ColumnRef::new("staging.orders", "cents"),
        ]
    );
}

#[tokio::test]
async fn test_column_dependencies() {
    let graph = ColumnLineageGraph::from_pipeline(&resolved().await);
    let amount = ColumnRef::parse("mart.orders.amount").unwrap();

    assert_eq!(
        graph.direct_dependencies(&amount),
        vec![ColumnRef::new("staging.orders", "cents")]
    );
    assert!(graph
        .all_upstream(&amount)
        .contains(&ColumnRef::new("raw.orders", "amount")));
    assert_eq!(
        graph.source_columns(),
        vec![
            ColumnRef::new("raw.orders", "amount"),
            ColumnRef::new("raw.orders", "id"),
        ]
    );
    // Lookups ignore case
    assert_eq!(
        graph
            .direct_dependents(&ColumnRef::new("STAGING.ORDERS", "CENTS"))
            .len(),
        2
    );
}

#[test]
fn test_asset_dependencies() {
    let graph = AssetGraph::from_pipeline(&pipeline());

    assert_eq!(graph.asset_count(), 4);
    assert_eq!(graph.dependency_count(), 3);
    assert_eq!(graph.direct_upstream("mart.orders"), vec!["staging.orders"]);
    assert_eq!(
        graph.all_upstream("mart.orders"),
        vec!["raw.orders", "staging.orders"]
    );
    assert_eq!(
        graph.direct_downstream("raw.orders"),
        vec!["audit.orders", "staging.orders"]
    );
    assert_eq!(
        graph.all_downstream("RAW.ORDERS"),
        vec!["audit.orders", "mart.orders", "staging.orders"]
    );
    assert!(graph.validate_no_cycles().is_ok());
}

#[test]
fn test_cycle_is_reported() {
    let mut pipeline = pipeline();
    pipeline
        .find_asset_mut("raw.orders")
        .unwrap()
        .upstreams
        .push(Upstream::asset("mart.orders"));

    let graph = AssetGraph::from_pipeline(&pipeline);
    let err = graph.validate_no_cycles().unwrap_err();

    assert_eq!(err.cycles.len(), 1);
    let mut members = err.cycles[0].clone();
    members.sort();
    assert_eq!(members, vec!["mart.orders", "raw.orders", "staging.orders"]);
}
