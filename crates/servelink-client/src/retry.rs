//! Error classification for the retry loop
//!
//! Three dispositions: fatal errors abort immediately and surface
//! unwrapped, cancellation propagates without touching the retry
//! budget, and everything else is retried against another pool member.

use tonic::{Code, Status};

/// How the retry loop reacts to a failed RPC attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// The backend affirmatively reported the model does not exist;
    /// retrying elsewhere cannot help
    Fatal,
    /// The caller cancelled; terminate without consuming budget
    Cancelled,
    /// Connectivity or availability failure; try the next member
    Retryable,
}

/// Classify a failed attempt's status
pub(crate) fn classify(status: &Status) -> Disposition {
    match status.code() {
        Code::Cancelled => Disposition::Cancelled,
        Code::NotFound if status.message().contains("Model") => Disposition::Fatal,
        _ => Disposition::Retryable,
    }
}
