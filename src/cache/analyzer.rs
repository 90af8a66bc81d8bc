//! Caching decorator for any [`LineageAnalyzer`].

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{lineage_key, AnalysisCache};
use crate::lineage::{AnalyzerResult, LineageAnalyzer, LineageResult, Schema};
use crate::sql::Dialect;

/// Serves repeated statements from an [`AnalysisCache`].
///
/// Results carrying analyzer errors are never stored. A broken cache only
/// costs performance: read and write failures are logged and the inner
/// analyzer is used as if the cache were absent.
pub struct CachedAnalyzer<A> {
    inner: A,
    cache: AnalysisCache,
}

impl<A: LineageAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A, cache: AnalysisCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    fn lookup(&self, key: &str) -> Option<LineageResult> {
        match self.cache.get(key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "lineage cache read failed");
                None
            }
        }
    }

    fn store(&self, key: &str, result: &LineageResult) {
        if let Err(e) = self.cache.set(key, result) {
            warn!(error = %e, "lineage cache write failed");
        }
    }
}

#[async_trait]
impl<A: LineageAnalyzer> LineageAnalyzer for CachedAnalyzer<A> {
    async fn column_lineage(
        &self,
        sql: &str,
        dialect: Dialect,
        schema: &Schema,
    ) -> AnalyzerResult<LineageResult> {
        let key = match lineage_key(sql, dialect, schema) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "failed to compute lineage cache key");
                None
            }
        };

        if let Some(hit) = key.as_deref().and_then(|k| self.lookup(k)) {
            debug!("lineage cache hit");
            return Ok(hit);
        }

        let result = self.inner.column_lineage(sql, dialect, schema).await?;
        if let Some(key) = key.as_deref() {
            if !result.has_errors() {
                self.store(key, &result);
            }
        }
        Ok(result)
    }
}
