//! SQL dialects known to the lineage analyzer.
//!
//! Every SQL asset type maps to exactly one dialect name that the analyzer
//! understands. Asset types without a dialect (scripts, ingestion jobs,
//! seeds) have no column lineage and are skipped by the engine.
//!
//! | Asset type | Dialect |
//! |------------|---------|
//! | `bq.sql` | `bigquery` |
//! | `sf.sql` | `snowflake` |
//! | `pg.sql` | `postgres` |
//! | `my.sql` | `mysql` |
//! | `rs.sql` | `redshift` |
//! | `athena.sql` | `athena` |
//! | `clickhouse.sql` | `clickhouse` |
//! | `databricks.sql` | `databricks` |
//! | `ms.sql`, `synapse.sql` | `tsql` |
//! | `duckdb.sql` | `duckdb` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::AssetType;

/// A SQL dialect understood by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    BigQuery,
    Snowflake,
    Postgres,
    MySql,
    Redshift,
    Athena,
    ClickHouse,
    Databricks,
    TSql,
    DuckDb,
}

impl Dialect {
    pub const ALL: [Dialect; 10] = [
        Dialect::BigQuery,
        Dialect::Snowflake,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Redshift,
        Dialect::Athena,
        Dialect::ClickHouse,
        Dialect::Databricks,
        Dialect::TSql,
        Dialect::DuckDb,
    ];

    /// Dialect name as sent to the analyzer.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::BigQuery => "bigquery",
            Dialect::Snowflake => "snowflake",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Redshift => "redshift",
            Dialect::Athena => "athena",
            Dialect::ClickHouse => "clickhouse",
            Dialect::Databricks => "databricks",
            Dialect::TSql => "tsql",
            Dialect::DuckDb => "duckdb",
        }
    }

    /// Dialect for an asset type, or `None` for non-SQL assets.
    pub fn for_asset_type(asset_type: &AssetType) -> Option<Dialect> {
        let dialect = match asset_type.as_str() {
            "bq.sql" => Dialect::BigQuery,
            "sf.sql" => Dialect::Snowflake,
            "pg.sql" => Dialect::Postgres,
            "my.sql" => Dialect::MySql,
            "rs.sql" => Dialect::Redshift,
            "athena.sql" => Dialect::Athena,
            "clickhouse.sql" => Dialect::ClickHouse,
            "databricks.sql" => Dialect::Databricks,
            "ms.sql" | "synapse.sql" => Dialect::TSql,
            "duckdb.sql" => Dialect::DuckDb,
            _ => return None,
        };
        Some(dialect)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDialect(s.to_string()))
    }
}

/// Asset type -> dialect lookup consumed by the lineage engine.
pub trait DialectLookup: Send + Sync {
    fn dialect_for(&self, asset_type: &AssetType) -> Option<Dialect>;
}

/// The built-in asset type table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDialects;

impl DialectLookup for BuiltinDialects {
    fn dialect_for(&self, asset_type: &AssetType) -> Option<Dialect> {
        Dialect::for_asset_type(asset_type)
    }
}
