//! Persisted identity records.
//!
//! Both records serialize as camelCase JSON so they are byte-compatible
//! with what earlier app versions wrote under the same storage keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The active record of a device's identity and authentication state.
///
/// At most one session is persisted per storage scope, under
/// [`SESSION_KEY`](crate::defaults::SESSION_KEY). `user_id` and `device_id`
/// never change after creation; the [`SessionManager`](crate::SessionManager)
/// is the sole mutator of the remaining fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Globally unique identifier, derived from the device fingerprint,
    /// creation time, and a random suffix. Immutable once created.
    pub user_id: String,
    /// Stable device fingerprint. Immutable.
    pub device_id: String,
    /// Display name; mutable through
    /// [`SessionManager::update_username`](crate::SessionManager::update_username).
    pub username: String,
    /// Creation time of this identity.
    pub created_at: DateTime<Utc>,
    /// Updated on every successful initialize and authenticate.
    pub last_login: DateTime<Utc>,
    /// True until the first username update.
    pub is_first_login: bool,
    /// True only after a successful passphrase check.
    pub is_authenticated: bool,
}

/// The persisted credential triple, plus the retained plaintext passphrase.
///
/// Invariant: `hashed_passphrase == hash(passphrase, salt)` for the stored
/// triple. External mutation of one field without the others breaks
/// authentication.
///
/// The plaintext is retained so it can be re-displayed to the user — there
/// is no email channel to recover through. The record should only ever be
/// persisted behind the most restrictive backend the host offers, and its
/// memory is zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Mirrors [`Session::username`]; kept in sync on update.
    pub username: String,
    /// Per-credential random salt, regenerated on passphrase change.
    pub salt: String,
    /// Lowercase hex digest of `passphrase + salt`.
    pub hashed_passphrase: String,
    /// Retained plaintext, for re-display at account creation.
    pub passphrase: String,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("salt", &"<redacted>")
            .field("hashed_passphrase", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Read-only credential projection handed to the UI for display.
///
/// Zeroized on drop like the record it is cut from.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CredentialView {
    /// Current username.
    pub username: String,
    /// Plaintext passphrase.
    pub passphrase: String,
}

impl fmt::Debug for CredentialView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialView")
            .field("username", &self.username)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
