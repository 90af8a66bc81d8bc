//! Persistent cache of analyzer answers.
//!
//! The analyzer is the slow part of a lineage run, and its answer depends
//! only on the rendered statement, the dialect and the schema hint. Those
//! three are hashed into the key (see [`lineage_key`]); the stored value is
//! the analyzer's JSON result.
//!
//! The database lives at `<cache_dir>/sluice/lineage-cache.db` unless a path
//! is configured. Its layout is versioned through SQLite's `user_version`;
//! opening a database written by another version drops every entry.

mod analyzer;
mod hash;

pub use analyzer::CachedAnalyzer;
pub use hash::{compute_hash, lineage_key};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cached value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no cache directory available on this platform")]
    NoCacheDir,

    #[error("failed to create cache directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache connection poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// SQLite store of analyzer results keyed by request hash.
pub struct AnalysisCache {
    conn: Mutex<Connection>,
}

impl AnalysisCache {
    /// Open the cache at the platform default location.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(&Self::default_path()?)
    }

    pub fn open_at(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    pub fn default_path() -> CacheResult<PathBuf> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join("sluice").join("lineage-cache.db"))
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Look up `key`, counting a hit when present.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let conn = self.conn()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT result FROM lineage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = stored else {
            return Ok(None);
        };
        conn.execute(
            "UPDATE lineage SET hits = hits + 1 WHERE key = ?1",
            params![key],
        )?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO lineage (key, result, hits, stored_at) VALUES (?1, ?2, 0, ?3)",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove one entry; returns whether it existed.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let rows = self
            .conn()?
            .execute("DELETE FROM lineage WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    pub fn clear_all(&self) -> CacheResult<()> {
        self.conn()?.execute("DELETE FROM lineage", [])?;
        Ok(())
    }

    pub fn stats(&self) -> CacheResult<CacheStats> {
        let (entries, bytes, hits): (i64, i64, i64) = self.conn()?.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(result)), 0), COALESCE(SUM(hits), 0) FROM lineage",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(CacheStats {
            entry_count: entries as usize,
            total_size_bytes: bytes as usize,
            hit_count: hits as u64,
        })
    }
}

/// Bring the database to the current layout, dropping stale entries.
fn migrate(conn: &Connection) -> CacheResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version == SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(&format!(
        "
        DROP TABLE IF EXISTS lineage;
        CREATE TABLE lineage (
            key TEXT PRIMARY KEY,
            result TEXT NOT NULL,
            hits INTEGER NOT NULL DEFAULT 0,
            stored_at TEXT NOT NULL
        );
        PRAGMA user_version = {SCHEMA_VERSION};
        "
    ))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    /// Combined length of the stored JSON results.
    pub total_size_bytes: usize,
    /// Lookups answered from the cache since entries were stored.
    pub hit_count: u64,
}
