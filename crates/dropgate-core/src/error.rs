//! Error types module
//!
//! All batch-level failures are unified under the `EngineError` enum. The
//! taxonomy matters for recovery: `Validation` is always recovered locally
//! (recorded as an unsupported file, never a batch failure), `DestinationGone`
//! aborts the batch but preserves the session, `Transfer` aborts the batch at
//! the failing item, and `Configuration` is fatal for the batch with no retry.
//! `Audit` is best-effort by policy and must never reach the user.

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Classification or size rejection. Recovered locally, never propagated
    /// as a batch failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The selected destination no longer resolves to a current child of the
    /// root folder. The session is preserved so the batch can be retried
    /// against another destination.
    #[error("destination no longer exists: {0}")]
    DestinationGone(String),

    /// A transient reference expired or the remote store rejected a fetch or
    /// put. Aborts the batch at the named item; already-uploaded items stay.
    #[error("transfer failed for {item}: {reason}")]
    Transfer { item: String, reason: String },

    /// A required fixture (the root folder) is absent. Fatal, not retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Audit recording failed. Logged and swallowed by the intake engine.
    #[error("audit recording failed: {0}")]
    Audit(String),
}

impl EngineError {
    /// Transfer error helper naming the failing item.
    pub fn transfer(item: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        EngineError::Transfer {
            item: item.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this failure leaves the session intact for a retry.
    pub fn preserves_session(&self) -> bool {
        matches!(
            self,
            EngineError::DestinationGone(_) | EngineError::Configuration(_)
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_error_names_the_item() {
        let err = EngineError::transfer("report.pdf", "token expired");
        assert_eq!(
            err.to_string(),
            "transfer failed for report.pdf: token expired"
        );
    }

    #[test]
    fn destination_gone_preserves_session() {
        assert!(EngineError::DestinationGone("Events".into()).preserves_session());
        assert!(!EngineError::transfer("a.jpg", "x").preserves_session());
    }
}
