//! Upstream reconciliation.
//!
//! After an asset's columns are merged, every upstream's `columns` list is
//! brought up to date with the source columns the statement actually reads
//! from it. Entries are only ever appended, so running resolution twice is
//! a no-op the second time.

use super::types::{LineageResult, WILDCARD};
use crate::pipeline::{Asset, DependsColumn, Upstream};

/// Record every column `lineage` reads from each of the asset's upstreams.
pub fn reconcile_upstreams(asset: &mut Asset, lineage: &LineageResult) {
    let produced: Vec<String> = asset.columns.iter().map(|c| c.name.clone()).collect();

    for upstream in &mut asset.upstreams {
        // Filter / group / order / join columns
        for column in lineage.non_selected_columns.iter().filter(|c| !c.is_wildcard()) {
            if column.upstream.iter().any(|s| reads_from(upstream, &s.table)) {
                record(upstream, &column.name);
            }
        }

        for column in &lineage.columns {
            if column.is_wildcard() {
                if column.upstream.iter().any(|s| reads_from(upstream, &s.table)) {
                    for name in &produced {
                        record(upstream, name);
                    }
                }
                continue;
            }

            for source in &column.upstream {
                if reads_from(upstream, &source.table) {
                    record(upstream, &source.column);
                }
            }
        }
    }
}

fn reads_from(upstream: &Upstream, table: &str) -> bool {
    upstream.value.eq_ignore_ascii_case(table)
}

fn record(upstream: &mut Upstream, column: &str) {
    if column.is_empty() || column == WILDCARD || upstream.has_column(column) {
        return;
    }
    upstream.columns.push(DependsColumn::new(column));
}
