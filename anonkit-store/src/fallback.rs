//! Secure-preferred backend selection with transparent fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::{KeyValueStore, StoreError, StoreResult};

/// Pairs a preferred (secure) backend with a plain fallback backend.
///
/// Every operation is tried against the preferred backend first. Only a
/// *failure* engages the fallback; a successful read that finds nothing is a
/// miss, not a failure, and does not consult the fallback. When both
/// backends fail, the combined [`StoreError::AllBackendsFailed`] carries
/// both causes.
///
/// Secrets that land in the fallback backend are at rest unencrypted. The
/// fallback engagement is logged at `warn` so hosts can surface degraded
/// storage to their telemetry.
pub struct FallbackStore {
    preferred: Arc<dyn KeyValueStore>,
    fallback: Arc<dyn KeyValueStore>,
}

impl FallbackStore {
    /// Creates a fallback store from the two backends.
    #[must_use]
    pub fn new(preferred: Arc<dyn KeyValueStore>, fallback: Arc<dyn KeyValueStore>) -> Self {
        Self {
            preferred,
            fallback,
        }
    }
}

impl std::fmt::Debug for FallbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for FallbackStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.preferred.get(key).await {
            Ok(value) => Ok(value),
            Err(preferred_err) => {
                warn!(key, error = %preferred_err, "preferred backend failed on get, using fallback");
                self.fallback
                    .get(key)
                    .await
                    .map_err(|fallback_err| {
                        StoreError::all_backends_failed(&preferred_err, &fallback_err)
                    })
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self.preferred.set(key, value).await {
            Ok(()) => Ok(()),
            Err(preferred_err) => {
                warn!(key, error = %preferred_err, "preferred backend failed on set, using fallback");
                self.fallback
                    .set(key, value)
                    .await
                    .map_err(|fallback_err| {
                        StoreError::all_backends_failed(&preferred_err, &fallback_err)
                    })
            }
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self.preferred.delete(key).await {
            Ok(()) => Ok(()),
            Err(preferred_err) => {
                warn!(key, error = %preferred_err, "preferred backend failed on delete, using fallback");
                self.fallback
                    .delete(key)
                    .await
                    .map_err(|fallback_err| {
                        StoreError::all_backends_failed(&preferred_err, &fallback_err)
                    })
            }
        }
    }
}
