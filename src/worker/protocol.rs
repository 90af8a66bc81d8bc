//! Protocol types for analyzer worker communication.
//!
//! One JSON object per line in each direction. Requests carry a unique id;
//! responses echo it and may arrive in any order.

use serde::{Deserialize, Serialize};

use crate::lineage::Schema;
use crate::sql::Dialect;

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// One line written to the analyzer's stdin.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Echoed back in the matching response.
    pub id: String,
    /// Method name (e.g., "lineage.column_lineage").
    pub method: String,
    pub params: serde_json::Value,
}

/// One line read from the analyzer's stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub success: bool,
    /// Set when `success` is true.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Set when `success` is false.
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

impl ResponseEnvelope {
    /// Synthetic failure handed to callers still waiting when the worker dies.
    pub(crate) fn worker_exited(id: String) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(ErrorInfo {
                code: codes::WORKER_EXITED.to_string(),
                message: "analyzer exited before answering".to_string(),
            }),
        }
    }
}

/// Why the analyzer refused or failed a request.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// One of [`codes`].
    pub code: String,
    pub message: String,
}

// ============================================================================
// Lineage
// ============================================================================

/// Parameters for `lineage.column_lineage`.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnLineageParams<'a> {
    /// Rendered SQL statement.
    pub query: &'a str,
    pub dialect: Dialect,
    /// Known upstream tables.
    pub schema: &'a Schema,
}

// ============================================================================
// Method and error code names
// ============================================================================

/// Method name constants.
pub mod methods {
    pub const COLUMN_LINEAGE: &str = "lineage.column_lineage";
}

/// Error codes sent by the worker.
pub mod codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
    pub const PARSE_FAILED: &str = "PARSE_FAILED";
    pub const WORKER_EXITED: &str = "WORKER_EXITED";
}
