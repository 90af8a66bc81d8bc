//! WorkerAnalyzer implementation.
//!
//! The production [`LineageAnalyzer`]: forwards each statement to the
//! analyzer worker over the NDJSON protocol.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::protocol::{methods, ColumnLineageParams};
use super::WorkerClient;
use crate::lineage::{AnalyzerError, AnalyzerResult, LineageAnalyzer, LineageResult, Schema};
use crate::sql::Dialect;

/// Longest statement (in bytes) sent to the worker.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 10_000;

/// LineageAnalyzer backed by a [`WorkerClient`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use sluice::worker::{WorkerAnalyzer, WorkerClient};
///
/// let client = WorkerClient::spawn("./sqlglot-worker", &[]).await?;
/// let analyzer = WorkerAnalyzer::new(Arc::new(client));
/// ```
pub struct WorkerAnalyzer {
    /// The worker client for RPC calls.
    client: Arc<WorkerClient>,
    max_query_length: usize,
}

impl WorkerAnalyzer {
    pub fn new(client: Arc<WorkerClient>) -> Self {
        Self {
            client,
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }

    /// Convenience constructor that wraps an owned client in an `Arc`.
    pub fn with_client(client: WorkerClient) -> Self {
        Self::new(Arc::new(client))
    }

    pub fn with_max_query_length(mut self, max: usize) -> Self {
        self.max_query_length = max;
        self
    }

    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    pub fn client(&self) -> &WorkerClient {
        &self.client
    }
}

#[async_trait]
impl LineageAnalyzer for WorkerAnalyzer {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult> {
        if let Some(too_long) = check_length(sql, self.max_query_length) {
            debug!(len = sql.len(), max = self.max_query_length, "query too long for analysis");
            // Reported like any other analyzer-side failure
            return Ok(LineageResult::failed(too_long.to_string()));
        }

        let params = ColumnLineageParams {
            query: sql,
            dialect,
            schema,
        };
        Ok(self.client.request(methods::COLUMN_LINEAGE, params).await?)
    }
}

fn check_length(sql: &str, max: usize) -> Option<AnalyzerError> {
    (sql.len() > max).then(|| AnalyzerError::QueryTooLong {
        len: sql.len(),
        max,
    })
}
