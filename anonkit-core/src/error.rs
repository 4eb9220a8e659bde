//! Error outputs from the identity core.

use anonkit_store::StoreError;
use thiserror::Error;

/// Errors that can occur during identity and session operations.
///
/// Authentication mismatches are deliberately *not* represented here: a
/// wrong username or passphrase is the `Ok(false)` return of
/// [`SessionManager::authenticate_user`](crate::SessionManager::authenticate_user),
/// so callers cannot tell which field was wrong.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The storage layer failed on both backends or rejected the operation.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// An operation that requires a session was called with none active.
    #[error("no active user session")]
    NoActiveSession,

    /// A persisted record exists but cannot be decoded.
    ///
    /// Recoverable: calling
    /// [`SessionManager::initialize_user`](crate::SessionManager::initialize_user)
    /// discards the corrupt session record and registers a fresh identity.
    #[error("corrupt record under '{key}': {message}")]
    CorruptRecord {
        /// Storage key of the unreadable record.
        key: String,
        /// Decoder error message.
        message: String,
    },

    /// A storage operation exceeded the configured time bound.
    #[error("storage operation '{operation}' timed out")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
    },
}

impl IdentityError {
    /// Creates a corrupt-record error.
    pub fn corrupt<K: Into<String>, M: ToString>(key: K, message: &M) -> Self {
        Self::CorruptRecord {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IdentityError::NoActiveSession;
        assert_eq!(format!("{err}"), "no active user session");

        let err = IdentityError::corrupt("userSession", &"expected value at line 1");
        assert!(format!("{err}").contains("userSession"));

        let err = IdentityError::timeout("userCredentials");
        assert!(format!("{err}").contains("timed out"));
    }
}
