//! Well-known storage keys and tuning defaults.

use std::time::Duration;

/// Storage key holding the cached device fingerprint.
pub const DEVICE_ID_KEY: &str = "deviceId";

/// Storage key holding the serialized [`Session`](crate::Session).
pub const SESSION_KEY: &str = "userSession";

/// Storage key holding the serialized [`CredentialRecord`](crate::CredentialRecord).
pub const CREDENTIALS_KEY: &str = "userCredentials";

/// Length in hex characters of a derived device fingerprint.
pub const DEVICE_ID_HEX_LEN: usize = 16;

/// Length in characters of a generated salt.
pub const SALT_LEN: usize = 16;

/// Upper bound on any single storage operation.
///
/// A hung backend surfaces as [`IdentityError::Timeout`](crate::IdentityError::Timeout)
/// instead of hanging the caller indefinitely. Override per manager with
/// [`SessionManager::with_timeout`](crate::SessionManager::with_timeout).
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(5);
