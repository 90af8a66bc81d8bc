//! Column merge engine.
//!
//! Folds one statement's lineage into the asset's column list. Candidates
//! are computed against a shared borrow of the pipeline (they read upstream
//! columns), then applied to the asset through a mutable borrow, one output
//! column at a time so later columns see earlier merges.
//!
//! Merge rules for a column that already exists:
//!
//! | Field | Rule |
//! |-------|------|
//! | `description`, `type`, `entity_attribute` | filled only when unset |
//! | `update_on_merge` | taken from the candidate |
//! | `primary_key` | always cleared |
//! | `checks` | kept as authored |
//! | `upstreams` | candidate edges appended unless already present |

use super::error::LineageError;
use super::types::{ColumnLineage, LineageResult, SourceColumn};
use crate::pipeline::{Asset, Column, Pipeline, UpstreamColumn};

/// Merge every output column of `lineage` into the asset at `idx`.
pub fn merge_columns(
    pipeline: &mut Pipeline,
    idx: usize,
    lineage: &LineageResult,
) -> Result<(), LineageError> {
    for output in &lineage.columns {
        if !output.is_wildcard() && output.upstream.is_empty() {
            add_computed_column(asset_at(pipeline, idx)?, output)?;
            continue;
        }

        let candidates = if output.is_wildcard() {
            expand_wildcard(pipeline, output)
        } else {
            derive_candidates(pipeline, output)
        };

        let asset = asset_at(pipeline, idx)?;
        for candidate in candidates {
            merge_or_create(asset, candidate)?;
        }
    }
    Ok(())
}

fn asset_at(pipeline: &mut Pipeline, idx: usize) -> Result<&mut Asset, LineageError> {
    pipeline
        .get_mut(idx)
        .ok_or(LineageError::InvalidArguments("asset is not part of the pipeline"))
}

/// Literal or parameterless expression: first resolution wins.
fn add_computed_column(asset: &mut Asset, output: &ColumnLineage) -> Result<(), LineageError> {
    ensure_named(&output.name)?;
    if asset.column(&output.name).is_none() {
        asset
            .columns
            .push(Column::new(output.name.clone(), output.data_type.clone()));
    }
    Ok(())
}

/// Copy the columns of the first upstream selected with `*`.
///
/// Sources are walked in order. A known source with a named column is
/// passed over; a source outside the pipeline ends expansion with nothing
/// copied. Sources after the first `*` match are not expanded.
fn expand_wildcard(pipeline: &Pipeline, output: &ColumnLineage) -> Vec<Column> {
    for source in &output.upstream {
        let Some(upstream) = pipeline.find_asset(&source.table) else {
            return Vec::new();
        };
        if !source.is_wildcard() {
            continue;
        }
        return upstream
            .columns
            .iter()
            .cloned()
            .map(|mut column| {
                column.strip_constraints();
                column
            })
            .collect();
    }
    Vec::new()
}

fn derive_candidates(pipeline: &Pipeline, output: &ColumnLineage) -> Vec<Column> {
    output
        .upstream
        .iter()
        .filter(|source| !source.is_wildcard())
        .map(|source| derive_candidate(pipeline, output, source))
        .collect()
}

/// Candidate column for one `output <- source` edge.
fn derive_candidate(pipeline: &Pipeline, output: &ColumnLineage, source: &SourceColumn) -> Column {
    let Some(upstream) = pipeline.find_asset(&source.table) else {
        // External table: keep the reference, folded for stable comparisons
        return Column::new(output.name.clone(), output.data_type.clone())
            .with_upstream(source.column.clone(), source.table.to_lowercase());
    };

    let edge = UpstreamColumn::new(source.column.clone(), upstream.name().to_string());
    match upstream.column(&source.column) {
        Some(known) => {
            let mut candidate = known.clone();
            candidate.name = output.name.clone();
            candidate.strip_constraints();
            candidate.upstreams = vec![edge];
            candidate
        }
        None => {
            let mut candidate = Column::new(output.name.clone(), output.data_type.clone());
            candidate.upstreams.push(edge);
            candidate
        }
    }
}

/// Append `candidate`, or fold it into the same-named column.
pub fn merge_or_create(asset: &mut Asset, candidate: Column) -> Result<(), LineageError> {
    ensure_named(&candidate.name)?;
    match asset.column_mut(&candidate.name) {
        Some(existing) => fold_into(existing, candidate),
        None => asset.columns.push(candidate),
    }
    Ok(())
}

fn fold_into(existing: &mut Column, candidate: Column) {
    if existing.description.is_empty() {
        existing.description = candidate.description;
    }
    if existing.data_type.is_empty() {
        existing.data_type = candidate.data_type;
    }
    if existing.entity_attribute.is_none() {
        existing.entity_attribute = candidate.entity_attribute;
    }
    existing.update_on_merge = candidate.update_on_merge;
    existing.primary_key = false;

    for edge in candidate.upstreams {
        if !existing.has_upstream(&edge) {
            existing.upstreams.push(edge);
        }
    }
}

fn ensure_named(name: &str) -> Result<(), LineageError> {
    if name.is_empty() {
        return Err(LineageError::InvalidArguments(
            "column name must not be empty",
        ));
    }
    Ok(())
}
