//! Statement lineage adapter.
//!
//! Runs one asset through dialect selection, template rendering and the
//! analyzer, then folds the result into the pipeline.

use tracing::debug;

use super::analyzer::LineageAnalyzer;
use super::error::LineageError;
use super::merge::merge_columns;
use super::reconcile::reconcile_upstreams;
use super::schema::Schema;
use crate::pipeline::Pipeline;
use crate::render::TemplateRenderer;
use crate::sql::DialectLookup;

/// What happened to an asset handed to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The asset type has no SQL dialect.
    Skipped,
    /// Lineage was merged; `columns` is the analyzer's output column count.
    Resolved { columns: usize },
}

/// Borrowed collaborators for resolving single statements.
pub struct StatementAdapter<'a, A: ?Sized> {
    analyzer: &'a A,
    renderer: &'a dyn TemplateRenderer,
    dialects: &'a dyn DialectLookup,
}

impl<'a, A: LineageAnalyzer + ?Sized> StatementAdapter<'a, A> {
    pub fn new(
        analyzer: &'a A,
        renderer: &'a dyn TemplateRenderer,
        dialects: &'a dyn DialectLookup,
    ) -> Self {
        Self {
            analyzer,
            renderer,
            dialects,
        }
    }

    /// Resolve the asset at `idx` against `schema` and merge the result.
    pub async fn resolve(
        &self,
        pipeline: &mut Pipeline,
        idx: usize,
        schema: &Schema,
    ) -> Result<Resolution, LineageError> {
        let asset = pipeline
            .get(idx)
            .ok_or(LineageError::InvalidArguments("asset is not part of the pipeline"))?;

        let Some(dialect) = self.dialects.dialect_for(&asset.asset_type) else {
            debug!(asset_type = %asset.asset_type, "no dialect, skipping");
            return Ok(Resolution::Skipped);
        };

        if let Some(missing) = asset
            .asset_upstreams()
            .find(|u| pipeline.find_position(&u.value).is_none())
        {
            return Err(LineageError::UpstreamNotFound(missing.value.clone()));
        }

        let query = self.renderer.render(&asset.sql)?;
        let lineage = self
            .analyzer
            .column_lineage(&query, dialect, schema)
            .await?;
        if lineage.has_errors() {
            return Err(LineageError::Syntax(lineage.errors));
        }

        merge_columns(pipeline, idx, &lineage)?;
        if let Some(asset) = pipeline.get_mut(idx) {
            reconcile_upstreams(asset, &lineage);
        }

        Ok(Resolution::Resolved {
            columns: lineage.columns.len(),
        })
    }
}
