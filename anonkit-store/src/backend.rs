//! The storage backend trait implemented by hosts and built-in backends.

use async_trait::async_trait;

use crate::StoreResult;

/// String-keyed persistence with get/set/delete semantics.
///
/// Platform implementations should use the most restrictive store the host
/// offers (Keychain on iOS, Keystore-backed preferences on Android). The
/// identity core treats backends as opaque: it serializes records to JSON
/// strings and never relies on any backend-specific behavior beyond the
/// contract below.
///
/// # Contract
///
/// - `get` of a key that was never written returns `Ok(None)`, not an error.
/// - `set` overwrites silently.
/// - `delete` of an absent key succeeds.
/// - Any backend failure is reported as an error, never swallowed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot service the read.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot service the write.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes the value stored under `key`. Absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot service the delete.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}
