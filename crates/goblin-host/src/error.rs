//! Error types for the native messaging host.
//!
//! [`HostError`] is the top-level error that `main` propagates with `?`.
//! [`CodecError`] covers the length-prefixed frame codec.

/// Errors from reading or writing native messaging frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The pipe failed.
    #[error("frame I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A frame exceeded the size limit for its direction.
    #[error("frame of {len} bytes exceeds the {max}-byte limit")]
    FrameTooLarge {
        /// Declared or encoded frame length.
        len: usize,
        /// Limit for this direction.
        max: usize,
    },

    /// An outbound message could not be encoded.
    #[error("failed to encode frame: {source}")]
    Encode {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Top-level error for the host binary.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: goblin_core::ConfigError,
    },

    /// The state store could not be opened or initialized.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: goblin_store::StoreError,
    },

    /// The frame codec failed and the session cannot continue.
    #[error("codec error: {source}")]
    Codec {
        /// The underlying codec error.
        #[from]
        source: CodecError,
    },

    /// No data directory could be determined.
    #[error("no data directory: {message}")]
    DataDir {
        /// Description of the failure.
        message: String,
    },
}
