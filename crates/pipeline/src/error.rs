//! Error types for the pipeline ports.
//!
//! Neither type escapes to callers of the generator or the validator: both
//! services convert them into structured responses or safe defaults.

use rivalscope_core::error::CoreError;

/// Failure of a project, report or archive store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped back to a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(#[from] CoreError),

    /// A write collided with an existing row (e.g. duplicate version number).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the AI completion provider.
///
/// The generator treats every variant uniformly as an AI dependency
/// failure; the distinction only matters for logs and the error-kind tag.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Provider configuration is missing or invalid.
    #[error("Completion provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Completion request timed out")]
    Timeout,

    #[error("Completion provider unavailable: {0}")]
    Unavailable(String),

    #[error("Completion provider throttled the request")]
    Throttled,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status not covered above.
    #[error("Completion API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The provider answered but without usable text.
    #[error("Malformed completion response: {0}")]
    Malformed(String),
}
