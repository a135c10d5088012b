//! Error types for document store operations.

use thiserror::Error;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection path or document id is not addressable.
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    /// A must-exist write targeted a missing document.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A create-if-absent write targeted an existing document.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Field data could not be converted to or from a document.
    #[error("invalid document data: {0}")]
    InvalidData(String),

    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// JSON conversion failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::AlreadyExists("blockchain_ledger/BU-1".into());
        assert!(err.to_string().contains("blockchain_ledger/BU-1"));
    }
}
