//! Service error types.

use thiserror::Error;

/// Errors produced by services in this crate.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The search credential is not configured; the bridge never
    /// spawns without one.
    #[error("search is not configured: set the EXA_API_KEY environment variable")]
    MissingCredential,

    /// Transport-layer failure: spawn, pipe, or timeout trouble.
    #[error("transport error: {0}")]
    Transport(String),

    /// Protocol-layer failure (a JSON-RPC error from the server).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ServiceError>;
