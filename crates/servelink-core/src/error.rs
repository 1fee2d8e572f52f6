//! Error types for servelink

use thiserror::Error;

use crate::model::Address;

/// Main error type for servelink client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// No backend addresses are currently in the pool
    #[error("connection pool is empty")]
    EmptyPool,

    /// The backend affirmatively reported that the requested model does
    /// not exist. Never retried.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The caller cancelled the operation. Never retried and never
    /// recorded against the retry budget.
    #[error("operation cancelled")]
    Cancelled,

    /// Name resolution failed
    #[error("failed to resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    /// An RPC attempt failed with a retryable status
    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// Transport construction error (endpoint URI, TLS setup)
    #[error("transport error: {0}")]
    Transport(String),

    /// An address was inserted into the pool while already present
    #[error("address already in pool: {0}")]
    DuplicateAddress(Address),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Response payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// All retry attempts were exhausted. Carries every recorded error
    /// in attempt order.
    #[error("failed after {attempts} attempts")]
    RetryFailed {
        attempts: u32,
        errors: Vec<ClientError>,
    },
}

impl ClientError {
    /// Errors recorded across attempts, in attempt order. Empty for
    /// non-aggregate errors.
    pub fn attempt_errors(&self) -> &[ClientError] {
        match self {
            ClientError::RetryFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Result type for servelink client operations
pub type ClientResult<T> = Result<T, ClientError>;
