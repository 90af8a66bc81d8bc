//! SQL analyzer worker.
//!
//! Statement analysis (parsing, join and CTE resolution, star expansion) is
//! done by a separate long-running process. This module starts it, speaks
//! its line protocol, and exposes it as a [`LineageAnalyzer`].
//!
//! One exchange, one line each way:
//!
//! ```text
//! → {"id":"6f1c…","method":"lineage.column_lineage",
//!    "params":{"query":"select id from raw.orders","dialect":"bigquery",
//!              "schema":{"raw.orders":{"id":"int64"}}}}
//! ← {"id":"6f1c…","success":true,
//!    "result":{"columns":[{"name":"id","type":"int64",
//!              "upstream":[{"column":"id","table":"raw.orders"}]}],
//!              "non_selected_columns":[],"errors":[]}}
//! ```
//!
//! [`LineageAnalyzer`]: crate::lineage::LineageAnalyzer

mod analyzer;
mod client;
mod error;
pub mod protocol;

pub use analyzer::{WorkerAnalyzer, DEFAULT_MAX_QUERY_LENGTH};
pub use client::{WorkerClient, DEFAULT_TIMEOUT_SECS};
pub use error::{WorkerError, WorkerResult};
