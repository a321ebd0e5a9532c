//! Error types for document store operations.

/// Result type for all store operations in this crate.
///
/// This is a convenience type alias that defaults to using [`StoreError`] as the error type.
pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;

/// Unified error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("No document available at '{path}'")]
    NotFound { path: String },

    /// A create targeted a document that already exists.
    #[error("Document already exists at '{path}'")]
    AlreadyExists { path: String },

    /// A collection or document path is malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Document data has the wrong shape (for example, not a JSON object).
    #[error("Invalid document data: {0}")]
    InvalidData(String),

    /// Serialization errors when converting typed values to or from document data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transaction was already committed.
    #[error("Transaction is already committed")]
    TransactionClosed,

    /// The transaction exceeded the number of buffered writes a commit accepts.
    #[error("Transaction exceeds the limit of {limit} writes")]
    TooManyWrites { limit: usize },

    /// Backend-specific failure of a store round trip.
    #[error("Store operation failed: {operation} - {details}")]
    Backend { operation: String, details: String },
}

impl StoreError {
    /// Create a not found error for the given path.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Create an already exists error for the given path.
    pub fn already_exists(path: impl ToString) -> Self {
        Self::AlreadyExists {
            path: path.to_string(),
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Self::InvalidPath(reason.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData(reason.into())
    }

    /// Create a backend error with operation context.
    pub fn backend(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Returns whether this error means the addressed document is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
