//! Cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::lineage::Schema;
use crate::sql::Dialect;
use crate::worker::protocol::{methods, ColumnLineageParams};

/// Hex SHA-256 of `value`'s JSON encoding.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let digest = Sha256::digest(serde_json::to_vec(value)?);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Key for one analyzer call.
///
/// Hashes the exact parameters the analyzer would receive, so any change to
/// the statement, dialect or upstream schema misses. The schema's tables and
/// columns serialize in sorted order.
pub fn lineage_key(
    query: &str,
    dialect: Dialect,
    schema: &Schema,
) -> Result<String, serde_json::Error> {
    let params = ColumnLineageParams {
        query,
        dialect,
        schema,
    };
    Ok(format!("{}:{}", methods::COLUMN_LINEAGE, compute_hash(&params)?))
}
