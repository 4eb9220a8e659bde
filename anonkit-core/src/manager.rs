//! The session lifecycle manager.

use std::sync::Arc;
use std::time::Duration;

use anonkit_store::{KeyValueStore, StoreError};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::defaults::{CREDENTIALS_KEY, DEVICE_ID_KEY, SESSION_KEY, STORAGE_TIMEOUT};
use crate::device::{DeviceIdentity, DeviceInfoProvider};
use crate::error::IdentityError;
use crate::generate::{generate_passphrase, generate_username};
use crate::hasher::{generate_salt, hash_passphrase, verify_passphrase};
use crate::session::{CredentialRecord, CredentialView, Session};

/// Owns the session state machine and is the sole mutator of the persisted
/// [`Session`] and [`CredentialRecord`].
///
/// Construct one per storage scope at process start and hand it to
/// consumers by reference; every dependency (storage backend, device
/// attribute source) is injected, so tests swap them freely.
///
/// The cached session lives behind a mutex whose guard is held across the
/// whole of [`initialize_user`](Self::initialize_user), which serializes
/// concurrent initialization and keeps identity creation at-most-once per
/// storage scope. Every storage await is bounded by the configured timeout.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    device: DeviceIdentity,
    session: Mutex<Option<Session>>,
    op_timeout: Duration,
}

impl SessionManager {
    /// Creates a manager over the given storage backend and device
    /// attribute source.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, info: Arc<dyn DeviceInfoProvider>) -> Self {
        let device = DeviceIdentity::new(Arc::clone(&store), info);
        Self {
            store,
            device,
            session: Mutex::new(None),
            op_timeout: STORAGE_TIMEOUT,
        }
    }

    /// Overrides the per-operation storage timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Loads the persisted session, or registers a fresh identity when none
    /// exists.
    ///
    /// An existing session is returned with `last_login` refreshed; every
    /// other field, including `is_authenticated`, is preserved verbatim
    /// from storage. A corrupt session record is discarded with a warning
    /// and a fresh identity is registered in its place — the recovery path
    /// for unreadable state.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out.
    pub async fn initialize_user(&self) -> Result<Session, IdentityError> {
        // Holding the cache lock for the whole call serializes racing
        // initializers; the loser observes the winner's persisted session.
        let mut cached = self.session.lock().await;

        let existing = match self.read_session().await {
            Ok(existing) => existing,
            Err(IdentityError::CorruptRecord { key, message }) => {
                warn!(key = %key, message = %message, "discarding corrupt session record, re-registering");
                None
            }
            Err(err) => return Err(err),
        };

        if let Some(mut session) = existing {
            session.last_login = Utc::now();
            self.write_record(SESSION_KEY, &session).await?;
            debug!(user_id = %session.user_id, "reloaded existing session");
            *cached = Some(session.clone());
            return Ok(session);
        }

        let device_id = self.bounded(DEVICE_ID_KEY, self.device.device_id()).await??;
        let username = generate_username();
        let passphrase = generate_passphrase();
        let now = Utc::now();

        let session = Session {
            user_id: new_user_id(&device_id),
            device_id,
            username: username.clone(),
            created_at: now,
            last_login: now,
            is_first_login: true,
            is_authenticated: false,
        };

        let salt = generate_salt();
        let hashed_passphrase = hash_passphrase(&passphrase, &salt);
        let credentials = CredentialRecord {
            username,
            salt,
            hashed_passphrase,
            passphrase,
        };

        self.write_record(SESSION_KEY, &session).await?;
        self.write_record(CREDENTIALS_KEY, &credentials).await?;
        *cached = Some(session.clone());
        info!(user_id = %session.user_id, "registered new anonymous identity");
        Ok(session)
    }

    /// Checks the supplied credentials against the stored record.
    ///
    /// Returns `true` and transitions the session to authenticated only if
    /// both the username and the recomputed passphrase hash match. Any
    /// mismatch — including a missing credential record — returns `false`
    /// with no state mutation, and the return value does not reveal which
    /// field was wrong.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out, or if the stored
    /// credential record is unreadable.
    pub async fn authenticate_user(
        &self,
        username: &str,
        passphrase: &str,
    ) -> Result<bool, IdentityError> {
        let Some(credentials) = self.read_credentials().await? else {
            return Ok(false);
        };

        let username_matches = credentials.username == username;
        let passphrase_matches =
            verify_passphrase(passphrase, &credentials.salt, &credentials.hashed_passphrase);
        if !(username_matches && passphrase_matches) {
            debug!("authentication attempt rejected");
            return Ok(false);
        }

        let mut cached = self.session.lock().await;
        if cached.is_none() {
            match self.read_session().await {
                Ok(loaded) => *cached = loaded,
                Err(err) => {
                    warn!(error = %err, "session record unreadable after successful credential check");
                }
            }
        }
        if let Some(session) = cached.as_mut() {
            session.is_authenticated = true;
            session.last_login = Utc::now();
            self.write_record(SESSION_KEY, session).await?;
            info!(user_id = %session.user_id, "session authenticated");
        }
        Ok(true)
    }

    /// Returns the current session, loading it from storage when not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out, or if the persisted
    /// session record is corrupt.
    pub async fn get_current_user(&self) -> Result<Option<Session>, IdentityError> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(Some(session.clone()));
        }
        let loaded = self.read_session().await?;
        cached.clone_from(&loaded);
        Ok(loaded)
    }

    /// Returns the stored username/passphrase pair for display.
    ///
    /// The plaintext passphrase remains retrievable for the lifetime of the
    /// credential record; with no other recovery channel, this is the
    /// documented trade-off for letting users re-read their credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out, or if the stored
    /// credential record is unreadable.
    pub async fn get_user_credentials(&self) -> Result<Option<CredentialView>, IdentityError> {
        Ok(self.read_credentials().await?.map(|record| CredentialView {
            username: record.username.clone(),
            passphrase: record.passphrase.clone(),
        }))
    }

    /// Renames the user, mirroring the change into the credential record.
    ///
    /// Marks the session as past its first login.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NoActiveSession`] if no session is cached
    /// in memory, or a storage error if persisting fails.
    pub async fn update_username(&self, new_username: &str) -> Result<(), IdentityError> {
        let mut cached = self.session.lock().await;
        let session = cached.as_mut().ok_or(IdentityError::NoActiveSession)?;

        session.username = new_username.to_string();
        session.is_first_login = false;
        self.write_record(SESSION_KEY, session).await?;

        if let Some(mut credentials) = self.read_credentials().await? {
            credentials.username = new_username.to_string();
            self.write_record(CREDENTIALS_KEY, &credentials).await?;
        }
        info!(user_id = %session.user_id, "username updated");
        Ok(())
    }

    /// Replaces the passphrase: fresh salt, recomputed hash, rewritten
    /// record.
    ///
    /// The old passphrase stops verifying as soon as the record is
    /// persisted. With no stored credential record this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out, or if the stored
    /// credential record is unreadable.
    pub async fn update_passphrase(&self, new_passphrase: &str) -> Result<(), IdentityError> {
        if let Some(mut credentials) = self.read_credentials().await? {
            credentials.salt = generate_salt();
            credentials.hashed_passphrase = hash_passphrase(new_passphrase, &credentials.salt);
            credentials.passphrase = new_passphrase.to_string();
            self.write_record(CREDENTIALS_KEY, &credentials).await?;
            info!("passphrase rotated");
        }
        Ok(())
    }

    /// Logs out: drops the cached session and deletes the persisted one.
    ///
    /// The credential record is intentionally retained — this device can
    /// re-authenticate with the same username/passphrase without
    /// re-registration. That retention is a deliberate re-binding policy,
    /// not an oversight; hosts wanting a full wipe must clear their storage
    /// scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage delete fails or times out.
    pub async fn clear_session(&self) -> Result<(), IdentityError> {
        let mut cached = self.session.lock().await;
        *cached = None;
        self.bounded(SESSION_KEY, self.store.delete(SESSION_KEY))
            .await??;
        info!("session cleared");
        Ok(())
    }

    /// Returns the current user's id.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NoActiveSession`] when no session exists in
    /// memory or storage.
    pub async fn get_user_id(&self) -> Result<String, IdentityError> {
        self.get_current_user()
            .await?
            .map(|session| session.user_id)
            .ok_or(IdentityError::NoActiveSession)
    }

    /// Whether the current session has passed a passphrase check in this
    /// lifetime (or was persisted as authenticated). `false` when no
    /// session exists.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the session fails.
    pub async fn is_authenticated(&self) -> Result<bool, IdentityError> {
        Ok(self
            .get_current_user()
            .await?
            .is_some_and(|session| session.is_authenticated))
    }

    /// Whether the current session is still on its first login. `false`
    /// when no session exists.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the session fails.
    pub async fn is_first_login(&self) -> Result<bool, IdentityError> {
        Ok(self
            .get_current_user()
            .await?
            .is_some_and(|session| session.is_first_login))
    }

    /// Returns the stable device fingerprint, deriving it on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or times out.
    pub async fn get_device_id(&self) -> Result<String, IdentityError> {
        self.bounded(DEVICE_ID_KEY, self.device.device_id()).await?
    }

    // Storage plumbing. Every await on the storage layer goes through
    // `bounded` so a hung backend surfaces as a typed timeout.

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, IdentityError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| IdentityError::timeout(operation))
    }

    async fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, IdentityError> {
        let Some(raw) = self.bounded(key, self.store.get(key)).await?? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| IdentityError::corrupt(key, &err))
    }

    async fn write_record<T: Serialize>(&self, key: &str, value: &T) -> Result<(), IdentityError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StoreError::serialization(err.to_string()))?;
        self.bounded(key, self.store.set(key, &raw)).await??;
        Ok(())
    }

    async fn read_session(&self) -> Result<Option<Session>, IdentityError> {
        self.read_record(SESSION_KEY).await
    }

    async fn read_credentials(&self) -> Result<Option<CredentialRecord>, IdentityError> {
        self.read_record(CREDENTIALS_KEY).await
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

/// Builds a user id from the device fingerprint, creation time, and a
/// random suffix. Never regenerated for an existing identity.
fn new_user_id(device_id: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "user_{device_id}_{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use anonkit_store::{MemoryStore, StoreResult};

    use crate::device::EnvDeviceInfo;

    use super::*;

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Arc::new(EnvDeviceInfo),
        );
        (store, manager)
    }

    #[tokio::test]
    async fn test_fresh_install_registers_identity() {
        let (_store, manager) = manager();

        let session = manager.initialize_user().await.unwrap();
        assert!(!session.is_authenticated);
        assert!(session.is_first_login);
        assert!(session.user_id.starts_with("user_"));
        assert!(session.user_id.contains(&session.device_id));

        let credentials = manager.get_user_credentials().await.unwrap().unwrap();
        assert_eq!(credentials.username, session.username);
        assert!(!credentials.passphrase.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (_store, manager) = manager();

        let first = manager.initialize_user().await.unwrap();
        let second = manager.initialize_user().await.unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.device_id, second.device_id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.last_login >= first.last_login);
    }

    #[tokio::test]
    async fn test_reload_preserves_authenticated_flag() {
        let store = Arc::new(MemoryStore::new());
        {
            let manager = SessionManager::new(
                Arc::clone(&store) as Arc<dyn KeyValueStore>,
                Arc::new(EnvDeviceInfo),
            );
            let session = manager.initialize_user().await.unwrap();
            let credentials = manager.get_user_credentials().await.unwrap().unwrap();
            assert!(manager
                .authenticate_user(&session.username, &credentials.passphrase)
                .await
                .unwrap());
        }

        // A new manager over the same storage scope simulates a restart.
        let manager = SessionManager::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Arc::new(EnvDeviceInfo),
        );
        let reloaded = manager.initialize_user().await.unwrap();
        assert!(reloaded.is_authenticated);
    }

    #[tokio::test]
    async fn test_authenticate_with_correct_credentials() {
        let (_store, manager) = manager();
        let session = manager.initialize_user().await.unwrap();
        let credentials = manager.get_user_credentials().await.unwrap().unwrap();

        let ok = manager
            .authenticate_user(&session.username, &credentials.passphrase)
            .await
            .unwrap();
        assert!(ok);

        let current = manager.get_current_user().await.unwrap().unwrap();
        assert!(current.is_authenticated);
        assert!(manager.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_passphrase_without_mutation() {
        let (_store, manager) = manager();
        let session = manager.initialize_user().await.unwrap();

        let ok = manager
            .authenticate_user(&session.username, "wrong-pass-00")
            .await
            .unwrap();
        assert!(!ok);

        let current = manager.get_current_user().await.unwrap().unwrap();
        assert!(!current.is_authenticated);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_username() {
        let (_store, manager) = manager();
        manager.initialize_user().await.unwrap();
        let credentials = manager.get_user_credentials().await.unwrap().unwrap();

        let ok = manager
            .authenticate_user("Nobody-Here-1", &credentials.passphrase)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_authenticate_without_credentials_returns_false() {
        let (_store, manager) = manager();
        let ok = manager
            .authenticate_user("Swift-Runner-7", "river-dawn-3")
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_update_username_flips_first_login_and_mirrors_record() {
        let (_store, manager) = manager();
        manager.initialize_user().await.unwrap();

        manager.update_username("Chosen-Name-1").await.unwrap();

        let session = manager.get_current_user().await.unwrap().unwrap();
        assert_eq!(session.username, "Chosen-Name-1");
        assert!(!session.is_first_login);
        assert!(!manager.is_first_login().await.unwrap());

        let credentials = manager.get_user_credentials().await.unwrap().unwrap();
        assert_eq!(credentials.username, "Chosen-Name-1");
    }

    #[tokio::test]
    async fn test_update_username_requires_active_session() {
        let (_store, manager) = manager();
        let err = manager.update_username("Chosen-Name-1").await.unwrap_err();
        assert!(matches!(err, IdentityError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_update_passphrase_invalidates_old_one() {
        let (_store, manager) = manager();
        let session = manager.initialize_user().await.unwrap();
        let old = manager.get_user_credentials().await.unwrap().unwrap();

        manager.update_passphrase("new-pass-42").await.unwrap();

        assert!(manager
            .authenticate_user(&session.username, "new-pass-42")
            .await
            .unwrap());
        assert!(!manager
            .authenticate_user(&session.username, &old.passphrase)
            .await
            .unwrap());

        let rotated = manager.get_user_credentials().await.unwrap().unwrap();
        assert_eq!(rotated.passphrase, "new-pass-42");
    }

    #[tokio::test]
    async fn test_clear_session_retains_credentials() {
        let (_store, manager) = manager();
        let session = manager.initialize_user().await.unwrap();
        let credentials = manager.get_user_credentials().await.unwrap().unwrap();

        manager.clear_session().await.unwrap();

        assert!(manager.get_current_user().await.unwrap().is_none());
        assert!(matches!(
            manager.get_user_id().await.unwrap_err(),
            IdentityError::NoActiveSession
        ));

        // Re-authentication on the same device still works against the
        // retained record.
        assert!(manager
            .authenticate_user(&session.username, &credentials.passphrase)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_initialize_after_clear_creates_new_user_id() {
        let (_store, manager) = manager();
        let first = manager.initialize_user().await.unwrap();

        manager.clear_session().await.unwrap();
        let second = manager.initialize_user().await.unwrap();

        assert_ne!(first.user_id, second.user_id);
        assert_eq!(first.device_id, second.device_id);
    }

    #[tokio::test]
    async fn test_device_id_is_stable() {
        let (_store, manager) = manager();
        let first = manager.get_device_id().await.unwrap();
        let second = manager.get_device_id().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_corrupt_session_record_recovers_by_reregistering() {
        let (store, manager) = manager();
        manager.initialize_user().await.unwrap();
        manager.clear_session().await.unwrap();

        store.set(SESSION_KEY, "{not valid json").await.unwrap();

        assert!(matches!(
            manager.get_current_user().await.unwrap_err(),
            IdentityError::CorruptRecord { .. }
        ));

        let session = manager.initialize_user().await.unwrap();
        assert!(session.is_first_login);
        assert!(manager.get_current_user().await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_initialize_creates_one_identity() {
        let (_store, manager) = manager();
        let manager = Arc::new(manager);

        let a = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.initialize_user().await.unwrap() })
        };
        let b = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.initialize_user().await.unwrap() })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(a.user_id, b.user_id);

        let credentials = manager.get_user_credentials().await.unwrap().unwrap();
        assert_eq!(credentials.username, a.username);
    }

    /// Backend whose reads never complete, standing in for a hung platform
    /// store.
    struct HangingStore;

    #[async_trait]
    impl KeyValueStore for HangingStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            std::future::pending().await
        }

        async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_hung_backend_times_out() {
        let manager = SessionManager::new(Arc::new(HangingStore), Arc::new(EnvDeviceInfo))
            .with_timeout(Duration::from_millis(50));

        let err = manager.initialize_user().await.unwrap_err();
        assert!(matches!(err, IdentityError::Timeout { .. }));
    }

    /// Backend that fails every operation, standing in for a locked
    /// platform secure store.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::unavailable("secure store locked"))
        }

        async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::unavailable("secure store locked"))
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::unavailable("secure store locked"))
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle_over_degraded_fallback_storage() {
        use anonkit_store::{FallbackStore, FileStore};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anonkit.json");

        let session = {
            let store = FallbackStore::new(
                Arc::new(BrokenStore),
                Arc::new(FileStore::new(&path)),
            );
            let manager =
                SessionManager::new(Arc::new(store) as Arc<dyn KeyValueStore>, Arc::new(EnvDeviceInfo));
            manager.initialize_user().await.unwrap()
        };

        // Restart: the identity written through the fallback path is still
        // there, and the credentials still verify.
        let store = FallbackStore::new(
            Arc::new(BrokenStore),
            Arc::new(FileStore::new(&path)),
        );
        let manager =
            SessionManager::new(Arc::new(store) as Arc<dyn KeyValueStore>, Arc::new(EnvDeviceInfo));

        let reloaded = manager.initialize_user().await.unwrap();
        assert_eq!(reloaded.user_id, session.user_id);
        assert_eq!(reloaded.device_id, session.device_id);

        let credentials = manager.get_user_credentials().await.unwrap().unwrap();
        assert!(manager
            .authenticate_user(&credentials.username, &credentials.passphrase)
            .await
            .unwrap());
    }
}
