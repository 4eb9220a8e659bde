//! Error types for the storage layer.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is not available on this host or rejected the operation.
    #[error("storage backend unavailable: {message}")]
    Unavailable {
        /// Description of why the backend is unavailable.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// Context describing the operation.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding the on-disk representation failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Both the preferred and the fallback backend failed.
    ///
    /// This is the storage-unavailable condition the identity core
    /// propagates to its callers; it is never swallowed at this layer.
    #[error("both storage backends failed: preferred: {preferred}; fallback: {fallback}")]
    AllBackendsFailed {
        /// Failure reported by the preferred backend.
        preferred: String,
        /// Failure reported by the fallback backend.
        fallback: String,
    },
}

impl StoreError {
    /// Creates an unavailable-backend error.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context.
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an all-backends-failed error from the two causes.
    pub fn all_backends_failed(preferred: &Self, fallback: &Self) -> Self {
        Self::AllBackendsFailed {
            preferred: preferred.to_string(),
            fallback: fallback.to_string(),
        }
    }
}
