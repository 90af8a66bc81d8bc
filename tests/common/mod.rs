//! Shared fixtures for the lineage integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sluice::lineage::{
    AnalyzerError, AnalyzerResult, ColumnLineage, LineageAnalyzer, LineageResult, Schema,
};
use sluice::render::QueryRenderer;
use sluice::sql::Dialect;

enum Reply {
    Lineage(LineageResult),
    Error(String),
}

/// Analyzer double answering from a table of canned replies.
///
/// Statements without a reply fall back to `select * from <table>`, which is
/// expanded from the schema hint. Anything else is reported as unparseable.
#[derive(Default)]
pub struct FakeAnalyzer {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Dialect)>>,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, sql: &str, result: LineageResult) -> Self {
        self.replies.insert(normalize(sql), Reply::Lineage(result));
        self
    }

    pub fn fail(mut self, sql: &str, message: &str) -> Self {
        self.replies
            .insert(normalize(sql), Reply::Error(message.to_string()));
        self
    }

    /// Statements analyzed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn dialects(&self) -> Vec<Dialect> {
        self.calls.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }

    pub fn call_count(&self, sql: &str) -> usize {
        let wanted = normalize(sql);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| normalize(s) == wanted)
            .count()
    }
}

#[async_trait]
impl LineageAnalyzer for FakeAnalyzer {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult> {
        self.calls.lock().unwrap().push((sql.to_string(), dialect));

        match self.replies.get(&normalize(sql)) {
            Some(Reply::Lineage(result)) => Ok(result.clone()),
            Some(Reply::Error(message)) => Err(AnalyzerError::Failed(message.clone())),
            None => Ok(select_star(sql, schema)
                .unwrap_or_else(|| LineageResult::failed(format!("cannot parse: {sql}")))),
        }
    }
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn select_star(sql: &str, schema: &Schema) -> Option<LineageResult> {
    let normalized = normalize(sql);
    let table = normalized.strip_prefix("select * from ")?.trim_end_matches(';');
    let columns = schema.table_ci(table)?;
    Some(LineageResult::with_columns(
        columns
            .iter()
            .map(|(name, data_type)| {
                ColumnLineage::new(name.clone(), data_type.clone()).from_source(table, name.clone())
            })
            .collect(),
    ))
}

/// Renderer pinned to a fixed day so rendered SQL is stable.
pub fn fixed_renderer() -> QueryRenderer {
    let day = Utc.with_ymd_and_hms(2024, 3, 14, 8, 0, 0).unwrap();
    QueryRenderer::for_day(day, "lineage-parser", "lineage-parser")
}
