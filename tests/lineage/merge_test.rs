#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;

use common::{fixed_renderer, FakeAnalyzer};
use pretty_assertions::assert_eq;
use sluice::lineage::merge::{merge_columns, merge_or_create};
use sluice::lineage::{ColumnLineage, LineageExtractor, LineageResult};
use sluice::pipeline::{
    Asset, Column, ColumnCheck, DependsColumn, EntityAttribute, Pipeline, Upstream,
    UpstreamColumn,
};

fn not_null() -> ColumnCheck {
    ColumnCheck {
        name: "not_null".to_string(),
        value: serde_json::Value::Null,
        blocking: true,
        description: String::new(),
    }
}

/// raw.orders with authored metadata on `id`.
fn raw_orders() -> Asset {
    let mut id = Column::new("id", "int64")
        .with_description("Order identifier")
        .primary_key();
    id.checks.push(not_null());
    id.entity_attribute = Some(EntityAttribute {
        entity: "order".to_string(),
        attribute: "id".to_string(),
    });

    Asset::new("raw.orders", "bq.seed")
        .with_column(id)
        .with_column(Column::new("amount", "float64").with_description("Gross amount"))
}

#[tokio::test]
async fn test_metadata_travels_across_hops() {
    let staging_sql = "select id as order_id, amount from raw.orders";
    let mart_sql = "select order_id from staging.orders";
    let mut pipeline = Pipeline::new(
        "chain",
        vec![
            raw_orders(),
            Asset::new("staging.orders", "bq.sql")
                .with_sql(staging_sql)
                .with_upstream(Upstream::asset("raw.orders")),
            Asset::new("mart.orders", "bq.sql")
                .with_sql(mart_sql)
                .with_upstream(Upstream::asset("staging.orders")),
        ],
    );
    let analyzer = FakeAnalyzer::new()
        .reply(
            staging_sql,
            LineageResult::with_columns(vec![
                ColumnLineage::new("order_id", "int64").from_source("raw.orders", "id"),
                ColumnLineage::new("amount", "float64").from_source("raw.orders", "amount"),
            ]),
        )
        .reply(
            mart_sql,
            LineageResult::with_columns(vec![
                ColumnLineage::new("order_id", "int64").from_source("staging.orders", "order_id"),
            ]),
        );
    let extractor = LineageExtractor::new(analyzer).with_renderer(fixed_renderer());

    let report = extractor
        .column_lineage(&mut pipeline, "mart.orders", &mut HashSet::new())
        .await;
    assert!(report.is_empty(), "unexpected issues: {report}");

    let staged = pipeline.asset("staging.orders").unwrap().column("order_id").unwrap();
    assert_eq!(staged.description, "Order identifier");
    assert!(!staged.primary_key);
    assert!(staged.checks.is_empty());
    assert!(staged.entity_attribute.is_some());
    assert_eq!(staged.upstreams, vec![UpstreamColumn::new("id", "raw.orders")]);

    let mart = pipeline.asset("mart.orders").unwrap().column("order_id").unwrap();
    assert_eq!(mart.description, "Order identifier");
    assert_eq!(mart.data_type, "int64");
    assert_eq!(
        mart.upstreams,
        vec![UpstreamColumn::new("order_id", "staging.orders")]
    );

    // The seed itself is untouched
    let raw = pipeline.asset("raw.orders").unwrap();
    assert!(raw.column("id").unwrap().primary_key);
    assert_eq!(raw.column("id").unwrap().checks.len(), 1);
}

#[tokio::test]
async fn test_authored_downstream_column_wins() {
    let sql = "select id, amount from raw.orders";
    let mut authored = Column::new("amount", "")
        .with_description("Net amount")
        .primary_key();
    authored.checks.push(not_null());

    let mut pipeline = Pipeline::new(
        "authored",
        vec![
            raw_orders(),
            Asset::new("mart.orders", "bq.sql")
                .with_sql(sql)
                .with_upstream(Upstream::asset("raw.orders"))
                .with_column(authored),
        ],
    );
    let analyzer = FakeAnalyzer::new().reply(
        sql,
        LineageResult::with_columns(vec![
            ColumnLineage::new("id", "int64").from_source("raw.orders", "id"),
            ColumnLineage::new("AMOUNT", "float64").from_source("raw.orders", "amount"),
        ]),
    );
    let extractor = LineageExtractor::new(analyzer).with_renderer(fixed_renderer());

    extractor.resolve_pipeline(&mut pipeline).await;

    let mart = pipeline.asset("mart.orders").unwrap();
    let names: Vec<_> = mart.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["amount", "id"]);

    let amount = mart.column("amount").unwrap();
    assert_eq!(amount.description, "Net amount");
    assert_eq!(amount.data_type, "float64");
    assert!(!amount.primary_key);
    assert_eq!(amount.checks, vec![not_null()]);
    assert_eq!(
        amount.upstreams,
        vec![UpstreamColumn::new("amount", "raw.orders")]
    );
}

#[tokio::test]
async fn test_wildcard_copies_upstream_columns() {
    let sql = "select * except (secret) from raw.orders";
    let mut pipeline = Pipeline::new(
        "wildcard",
        vec![
            raw_orders(),
            Asset::new("mart.orders", "bq.sql")
                .with_sql(sql)
                .with_upstream(Upstream::asset("raw.orders")),
        ],
    );
    let analyzer = FakeAnalyzer::new().reply(
        sql,
        LineageResult::with_columns(vec![ColumnLineage::new("*", "").from_source("raw.orders", "*")]),
    );
    let extractor = LineageExtractor::new(analyzer).with_renderer(fixed_renderer());

    let report = extractor.resolve_pipeline(&mut pipeline).await;
    assert!(report.is_empty());

    let mart = pipeline.asset("mart.orders").unwrap();
    let id = mart.column("id").unwrap();
    assert_eq!(id.description, "Order identifier");
    assert!(!id.primary_key);
    assert!(id.checks.is_empty());
    assert!(mart.column("amount").is_some());

    assert_eq!(
        mart.upstreams[0].columns,
        vec![DependsColumn::new("id"), DependsColumn::new("amount")]
    );
}

#[test]
fn test_column_fed_by_several_sources() {
    let mut pipeline = Pipeline::new(
        "coalesce",
        vec![
            Asset::new("a", "bq.sql").with_column(Column::new("email", "string")),
            Asset::new("b", "bq.sql"),
            Asset::new("people", "bq.sql")
                .with_upstream(Upstream::asset("a"))
                .with_upstream(Upstream::asset("b")),
        ],
    );
    let lineage = LineageResult::with_columns(vec![ColumnLineage::new("email", "string")
        .from_source("a", "email")
        .from_source("b", "contact_email")
        .from_source("crm.Contacts", "Email")]);

    let idx = pipeline.position("people").unwrap();
    merge_columns(&mut pipeline, idx, &lineage).unwrap();

    let people = pipeline.asset("people").unwrap();
    assert_eq!(people.columns.len(), 1);
    assert_eq!(
        people.columns[0].upstreams,
        vec![
            UpstreamColumn::new("email", "a"),
            UpstreamColumn::new("contact_email", "b"),
            UpstreamColumn::new("Email", "crm.contacts"),
        ]
    );
}

#[test]
fn test_analyzer_payload_merges_from_json() {
    let mut pipeline = Pipeline::new(
        "json",
        vec![
            raw_orders(),
            Asset::new("mart.orders", "bq.sql").with_upstream(Upstream::asset("raw.orders")),
        ],
    );
    let lineage: LineageResult = serde_json::from_str(
        r#"{
            "columns": [
                {"name": "id", "type": "INT64", "upstream": [{"column": "id", "table": "raw.orders"}]},
                {"name": "loaded_at", "type": "TIMESTAMP", "upstream": []}
            ],
            "non_selected_columns": [],
            "errors": []
        }"#,
    )
    .unwrap();

    let idx = pipeline.position("mart.orders").unwrap();
    merge_columns(&mut pipeline, idx, &lineage).unwrap();

    let mart = pipeline.asset("mart.orders").unwrap();
    // Known upstream columns keep their own type
    assert_eq!(mart.column("id").unwrap().data_type, "int64");
    assert_eq!(mart.column("loaded_at").unwrap().data_type, "TIMESTAMP");
    assert!(mart.column("loaded_at").unwrap().upstreams.is_empty());
}

#[test]
fn test_empty_candidate_name_is_rejected() {
    let mut asset = Asset::new("a", "bq.sql");
    let err = merge_or_create(&mut asset, Column::new("", "int64")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid arguments: column name must not be empty"
    );
    assert!(asset.columns.is_empty());
}
