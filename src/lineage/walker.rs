//! Graph walker: the public entry point of lineage resolution.

use std::collections::HashSet;

use tracing::{debug, info, info_span, warn, Instrument};

use super::adapter::{Resolution, StatementAdapter};
use super::analyzer::LineageAnalyzer;
use super::error::{LineageIssue, LineageReport};
use super::schema::project_upstreams_of;
use crate::pipeline::Pipeline;
use crate::render::{QueryRenderer, TemplateRenderer};
use crate::sql::{BuiltinDialects, DialectLookup};

/// Pipeline and run id used by the default renderer.
pub const DEFAULT_RENDER_CONTEXT: &str = "lineage-parser";

/// Worklist entry of the post-order traversal.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Mark visited and schedule upstreams.
    Enter(usize),
    /// All upstreams are done; analyze the asset itself.
    Resolve(usize),
}

/// Resolves column lineage across a pipeline, upstream first.
///
/// Each asset is analyzed at most once per visited set, so diamonds are
/// analyzed once and cycles terminate. Failures are collected per asset into
/// a [`LineageReport`]; they never stop the walk.
///
/// # Example
///
/// ```ignore
/// use std::collections::HashSet;
/// use sluice::lineage::LineageExtractor;
///
/// let extractor = LineageExtractor::new(analyzer);
/// let report = extractor
///     .column_lineage(&mut pipeline, "mart.orders", &mut HashSet::new())
///     .await;
/// for issue in report.iter() {
///     eprintln!("{}: {}", issue.asset, issue.description);
/// }
/// ```
pub struct LineageExtractor<A> {
    analyzer: A,
    renderer: Box<dyn TemplateRenderer>,
    dialects: Box<dyn DialectLookup>,
}

impl<A: LineageAnalyzer> LineageExtractor<A> {
    /// Extractor with the "yesterday" renderer and the built-in dialect table.
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            renderer: Box::new(QueryRenderer::with_yesterday(
                DEFAULT_RENDER_CONTEXT,
                DEFAULT_RENDER_CONTEXT,
            )),
            dialects: Box::new(BuiltinDialects),
        }
    }

    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_dialects(mut self, dialects: impl DialectLookup + 'static) -> Self {
        self.dialects = Box::new(dialects);
        self
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Resolve `asset` and everything upstream of it not yet in `visited`.
    ///
    /// An unknown asset name resolves nothing and reports nothing.
    pub async fn column_lineage(
        &self,
        pipeline: &mut Pipeline,
        asset: &str,
        visited: &mut HashSet<String>,
    ) -> LineageReport {
        let Some(root) = pipeline.find_position(asset) else {
            debug!(asset, "asset not in pipeline, nothing to resolve");
            return LineageReport::new();
        };
        self.walk(pipeline, root, visited).await
    }

    /// Resolve every asset in declaration order with one shared visited set.
    pub async fn resolve_pipeline(&self, pipeline: &mut Pipeline) -> LineageReport {
        let mut visited = HashSet::new();
        let mut report = LineageReport::new();
        for idx in 0..pipeline.len() {
            report.extend(self.walk(pipeline, idx, &mut visited).await);
        }

        info!(
            pipeline = %pipeline.name,
            assets = visited.len(),
            issues = report.len(),
            "column lineage resolved"
        );
        report
    }

    async fn walk(
        &self,
        pipeline: &mut Pipeline,
        root: usize,
        visited: &mut HashSet<String>,
    ) -> LineageReport {
        let mut report = LineageReport::new();
        let mut stack = vec![Step::Enter(root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(idx) => {
                    let Some(asset) = pipeline.get(idx) else {
                        continue;
                    };
                    if !visited.insert(asset.name().to_string()) {
                        continue;
                    }

                    stack.push(Step::Resolve(idx));
                    let upstreams: Vec<usize> = asset
                        .asset_upstreams()
                        .filter_map(|u| pipeline.find_position(&u.value))
                        .collect();
                    // Reversed so the first declared upstream is walked first
                    stack.extend(upstreams.into_iter().rev().map(Step::Enter));
                }
                Step::Resolve(idx) => {
                    if let Some(issue) = self.resolve_asset(pipeline, idx).await {
                        report.push(issue);
                    }
                }
            }
        }

        report
    }

    async fn resolve_asset(&self, pipeline: &mut Pipeline, idx: usize) -> Option<LineageIssue> {
        let asset = pipeline.get(idx)?;
        let name = asset.name().to_string();
        let schema = project_upstreams_of(pipeline, asset);

        let adapter = StatementAdapter::new(
            &self.analyzer,
            self.renderer.as_ref(),
            self.dialects.as_ref(),
        );
        let span = info_span!("lineage.asset", asset = %name);

        match adapter.resolve(pipeline, idx, &schema).instrument(span.clone()).await {
            Ok(Resolution::Skipped) => None,
            Ok(Resolution::Resolved { columns }) => {
                span.in_scope(|| debug!(columns, "lineage merged"));
                None
            }
            Err(err) => {
                span.in_scope(|| warn!(error = %err, "lineage resolution failed"));
                let sql = pipeline.get(idx).map(|a| a.sql.as_str()).unwrap_or_default();
                Some(LineageIssue::new(name, &err, sql))
            }
        }
    }
}
