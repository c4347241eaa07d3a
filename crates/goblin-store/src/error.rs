//! Error types for the state store.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! I/O and serialization errors with the key that was being accessed.

/// Errors that can occur while loading or saving the state document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        /// The document key being accessed.
        key: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused the operation.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
