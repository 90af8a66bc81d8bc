//! Errors raised while talking to the analyzer process.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::protocol::{codes, ErrorInfo};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("analyzer executable not configured (set analyzer.path or SLUICE_ANALYZER)")]
    NotConfigured,

    #[error("failed to start analyzer: {0}")]
    Spawn(#[source] io::Error),

    /// Writing a request line to the analyzer's stdin failed.
    #[error("failed to send request to analyzer: {0}")]
    Send(#[source] io::Error),

    #[error("failed to encode analyzer request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response arrived but its `result` does not have the expected shape.
    #[error("unexpected analyzer response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("analyzer did not answer within {0:?}")]
    Timeout(Duration),

    /// The analyzer closed stdout, or died with the request in flight.
    #[error("analyzer process exited unexpectedly")]
    Exited,

    #[error("analyzer rejected the request: {0}")]
    InvalidRequest(String),

    #[error("analyzer does not support method: {0}")]
    MethodNotFound(String),

    /// The statement could not be parsed; the message is the analyzer's own.
    #[error("{0}")]
    ParseFailed(String),

    #[error("analyzer error: {message} (code: {code})")]
    Remote { code: String, message: String },
}

impl WorkerError {
    /// Map a failed response onto a variant by its error code.
    pub fn from_error_info(info: ErrorInfo) -> Self {
        let ErrorInfo { code, message } = info;
        match code.as_str() {
            codes::INVALID_REQUEST => Self::InvalidRequest(message),
            codes::METHOD_NOT_FOUND => Self::MethodNotFound(message),
            codes::PARSE_FAILED => Self::ParseFailed(message),
            codes::WORKER_EXITED => Self::Exited,
            _ => Self::Remote { code, message },
        }
    }

    /// True when the process is gone and further requests are pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Exited | Self::Send(_) | Self::Spawn(_))
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for WorkerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Exited
    }
}
