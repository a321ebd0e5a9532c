//! Error types for reads, bulk processing and document helpers.

use docwalk_core::StoreError;

/// Result type for all operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for docwalk operations.
///
/// Handler failures during bulk processing are never returned through this
/// type: they are logged and counted in the
/// [`ProcessReport`](crate::ProcessReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A programming error in the caller: a projection set on the query,
    /// a limit above the store ceiling, a non-positive size or a missing
    /// required event payload.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// The requested document does not exist.
    #[error("No document available at '{path}'")]
    NotFound { path: String },

    /// Invalid walker configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A store round trip failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization errors when converting typed values to or from document data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Create a not found error for the given path.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns whether this error is a caller programming error.
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Returns an invariant violation carrying `message` unless `condition` holds.
#[inline]
pub(crate) fn invariant(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Invariant(message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_helper() {
        assert!(invariant(true, || "unused".into()).is_ok());

        let err = invariant(false, || "chunk size must be positive".into()).unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(
            err.to_string(),
            "Invariant violation: chunk size must be positive"
        );
    }

    #[test]
    fn store_errors_convert() {
        let err: Error = StoreError::backend("run_query", "unavailable").into();
        assert!(matches!(err, Error::Store(_)));
        assert!(!err.is_invariant());
    }
}
