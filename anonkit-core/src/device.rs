//! Device fingerprint derivation and caching.

use std::sync::Arc;

use anonkit_store::KeyValueStore;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::defaults::{DEVICE_ID_HEX_LEN, DEVICE_ID_KEY};
use crate::error::IdentityError;

/// Best-effort device and platform attributes used for fingerprinting.
///
/// Serialization order is declaration order, so the canonical encoding a
/// fingerprint is derived from is deterministic. None of these attributes
/// are hardware serials; the fingerprint identifies an *installation*, not
/// a device on a network.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAttributes {
    /// Operating system name (e.g. `ios`, `android`, `linux`).
    pub os_name: String,
    /// Operating system version, or `unknown`.
    pub os_version: String,
    /// Hardware model or architecture.
    pub model: String,
    /// BCP 47 locale, when the host exposes one.
    pub locale: Option<String>,
    /// IANA timezone name, when the host exposes one.
    pub timezone: Option<String>,
}

/// Host-provided source of device attributes.
///
/// Implementations return `None` when device introspection is unavailable
/// altogether; the fingerprint then degrades to a synthetic, install-local
/// identifier.
pub trait DeviceInfoProvider: Send + Sync {
    /// Collects whatever attributes the host can offer.
    fn attributes(&self) -> Option<DeviceAttributes>;
}

/// Default provider reading what the process environment exposes.
///
/// There is no OS-version or model introspection in the standard library,
/// so this provider reports the compile-time OS and architecture plus the
/// `LANG`/`TZ` environment, mirroring the attribute set the app uses on
/// hosts without a device-info bridge.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvDeviceInfo;

impl DeviceInfoProvider for EnvDeviceInfo {
    fn attributes(&self) -> Option<DeviceAttributes> {
        Some(DeviceAttributes {
            os_name: std::env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
            model: std::env::consts::ARCH.to_string(),
            locale: std::env::var("LANG").ok(),
            timezone: std::env::var("TZ").ok(),
        })
    }
}

/// Derives and caches the stable per-install fingerprint.
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
    info: Arc<dyn DeviceInfoProvider>,
}

impl DeviceIdentity {
    /// Creates a provider over the given store and attribute source.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, info: Arc<dyn DeviceInfoProvider>) -> Self {
        Self { store, info }
    }

    /// Returns the device fingerprint, deriving and persisting it on first
    /// call.
    ///
    /// Once persisted, the same identifier is returned for the remaining
    /// lifetime of the installation, across restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage layer fails on read or write.
    pub async fn device_id(&self) -> Result<String, IdentityError> {
        if let Some(existing) = self.store.get(DEVICE_ID_KEY).await? {
            return Ok(existing);
        }

        let id = match self.info.attributes() {
            Some(attributes) => {
                let id = fingerprint(&attributes)?;
                debug!(os = %attributes.os_name, "derived device fingerprint");
                id
            }
            None => {
                // No attributes at all: this identity cannot be re-derived
                // and exists only in this install's storage.
                let id = synthetic_id(&mut rand::thread_rng());
                warn!("device attributes unavailable, using synthetic install identifier");
                id
            }
        };

        self.store.set(DEVICE_ID_KEY, &id).await?;
        Ok(id)
    }
}

impl std::fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceIdentity").finish_non_exhaustive()
    }
}

/// Hashes the canonical attribute record down to a fixed-length hex id.
fn fingerprint(attributes: &DeviceAttributes) -> Result<String, IdentityError> {
    let canonical = serde_json::to_string(attributes)
        .map_err(|err| anonkit_store::StoreError::serialization(err.to_string()))?;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(DEVICE_ID_HEX_LEN);
    Ok(hex)
}

/// Builds the synthetic fallback identifier from the current time and a
/// random suffix.
fn synthetic_id<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..9)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)).to_ascii_lowercase())
        .collect();
    format!("device_{}_{suffix}", Utc::now().timestamp_millis())
}
