//! Error types for collaborator calls.

use std::time::Duration;
use thiserror::Error;

/// Errors from a remote collaborator call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// One attempt ran past its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,

    /// The response body could not be understood.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Every attempt failed.
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The client was configured with unusable values.
    #[error("invalid client config: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
