use std::fs;

use pretty_assertions::assert_eq;
use sluice::lineage::{project_all, project_upstreams_of};
use sluice::pipeline::{Pipeline, PipelineError, UpstreamColumn, UpstreamKind};

const PIPELINE_JSON: &str = r#"{
    "name": "orders",
    "assets": [
        {
            "name": "raw.orders",
            "type": "bq.seed",
            "columns": [
                {"name": "id", "type": "INT64", "description": "Order id", "primary_key": true,
                 "checks": [{"name": "not_null"}, {"name": "accepted_values", "value": ["a", "b"], "blocking": false}]},
                {"name": "amount", "type": "FLOAT64"}
            ]
        },
        {
            "name": "mart.orders",
            "type": "bq.sql",
            "sql": "select id, amount from raw.orders where dt = '{{ start_date }}'",
            "upstreams": [
                {"type": "asset", "value": "Raw.Orders"},
                {"type": "uri", "value": "gs://landing/orders.csv"}
            ],
            "columns": [
                {"name": "id", "upstreams": [{"column": "id", "table": "raw.orders"}]}
            ]
        }
    ]
}"#;

#[test]
fn test_load_pipeline_json() {
    let pipeline = Pipeline::from_json_str(PIPELINE_JSON).unwrap();

    assert_eq!(pipeline.name, "orders");
    assert_eq!(pipeline.len(), 2);

    let raw = pipeline.asset("raw.orders").unwrap();
    let id = raw.column("ID").unwrap();
    assert!(id.primary_key);
    assert_eq!(id.checks.len(), 2);
    assert!(id.checks[0].blocking);
    assert!(!id.checks[1].blocking);

    let mart = pipeline.asset("mart.orders").unwrap();
    assert_eq!(mart.upstreams[0].kind, UpstreamKind::Asset);
    assert_eq!(mart.upstreams[1].kind, UpstreamKind::Uri);
    assert_eq!(
        mart.column("id").unwrap().upstreams,
        vec![UpstreamColumn::new("id", "raw.orders")]
    );
    assert_eq!(mart.column("id").unwrap().data_type, "");
}

#[test]
fn test_upstream_lookup_is_case_insensitive() {
    let pipeline = Pipeline::from_json_str(PIPELINE_JSON).unwrap();
    let mart = pipeline.asset("mart.orders").unwrap();

    let upstream = &mart.upstreams[0].value;
    assert!(pipeline.asset(upstream).is_none());
    assert_eq!(pipeline.find_asset(upstream).unwrap().name(), "raw.orders");
}

#[test]
fn test_schema_projection() {
    let pipeline = Pipeline::from_json_str(PIPELINE_JSON).unwrap();

    let all = project_all(&pipeline);
    assert_eq!(all.len(), 2);
    assert_eq!(all.table("raw.orders").unwrap()["id"], "INT64");

    let mart = pipeline.asset("mart.orders").unwrap();
    let hint = project_upstreams_of(&pipeline, mart);
    let tables: Vec<_> = hint.tables().map(|(name, _)| name.as_str()).collect();
    assert_eq!(tables, vec!["raw.orders"]);
    assert_eq!(
        serde_json::to_value(&hint).unwrap(),
        serde_json::json!({"raw.orders": {"amount": "FLOAT64", "id": "INT64"}})
    );
}

#[test]
fn test_write_back_without_sql() {
    let mut pipeline = Pipeline::from_json_str(PIPELINE_JSON).unwrap();
    pipeline.wipe_sql();

    let json = pipeline.to_json_pretty().unwrap();
    let reloaded = Pipeline::from_json_str(&json).unwrap();

    assert!(reloaded.assets().iter().all(|a| a.sql.is_empty()));
    assert_eq!(reloaded.assets()[0], pipeline.assets()[0]);
    assert_eq!(reloaded.position("mart.orders"), Some(1));
}

#[test]
fn test_from_file() {
    let dir = std::env::temp_dir().join(format!("sluice-pipeline-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("pipeline.json");
    fs::write(&path, PIPELINE_JSON).unwrap();

    let pipeline = Pipeline::from_file(&path).unwrap();
    assert_eq!(pipeline.len(), 2);

    let missing = Pipeline::from_file(dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, PipelineError::FileNotFound(_)));

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        Pipeline::from_file(&path),
        Err(PipelineError::ParseError(_))
    ));

    fs::remove_dir_all(&dir).unwrap();
}
