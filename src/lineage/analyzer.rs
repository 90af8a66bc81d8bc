//! LineageAnalyzer trait definition.
//!
//! The analyzer is the SQL oracle the engine consults once per asset: given
//! one rendered statement, its dialect and a schema hint, it reports which
//! source columns feed each output column. Parsing, join resolution and CTE
//! following all live behind this trait.

use std::sync::Arc;

use async_trait::async_trait;

use super::schema::Schema;
use super::types::LineageResult;
use crate::sql::Dialect;
use crate::worker::WorkerError;

/// Result type for analyzer calls.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors raised by an analyzer before it could produce a result.
///
/// Syntax problems are not errors at this level: they come back inside
/// [`LineageResult::errors`].
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// Transport failure talking to the analyzer worker.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("query is too long skipping column lineage analysis")]
    QueryTooLong { len: usize, max: usize },

    /// Any other analyzer-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Column lineage for a single SQL statement.
///
/// Each call is awaited by the engine before it moves on, so
/// implementations don't need to support overlapping calls for the same
/// pipeline, although independent pipelines may share one analyzer.
///
/// # Example
///
/// ```ignore
/// use sluice::lineage::{AnalyzerResult, LineageAnalyzer, Schema};
/// use sluice::sql::Dialect;
///
/// async fn example(analyzer: &impl LineageAnalyzer) -> AnalyzerResult<()> {
///     let result = analyzer
///         .column_lineage("select id from orders", Dialect::BigQuery, &Schema::new())
///         .await?;
///     assert_eq!(result.columns[0].name, "id");
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait LineageAnalyzer: Send + Sync {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult>;
}

#[async_trait]
impl<A: LineageAnalyzer + ?Sized> LineageAnalyzer for Arc<A> {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult> {
        (**self).column_lineage(sql, dialect, schema).await
    }
}

#[async_trait]
impl<A: LineageAnalyzer + ?Sized> LineageAnalyzer for Box<A> {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult> {
        (**self).column_lineage(sql, dialect, schema).await
    }
}
