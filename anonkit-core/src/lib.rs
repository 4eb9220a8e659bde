//! Anonymous, device-bound identity for mobile applications.
//!
//! No email, no personal data: each installation generates a memorable
//! username/passphrase pair, binds it to a derived device fingerprint, and
//! persists a session record so the user can re-authenticate on the same
//! device.
//!
//! # Architecture
//!
//! - [`SessionManager`] — owns the session state machine and all persisted
//!   records; the single entry point for UI layers.
//! - [`DeviceIdentity`] — derives and caches the per-install fingerprint.
//! - [`generate_username`] / [`generate_passphrase`] — human-readable
//!   credential generation from fixed word lists.
//! - [`hash_passphrase`] / [`verify_passphrase`] — salted digests with
//!   constant-time verification.
//! - [`anonkit_store`] (re-exported as [`store`]) — the key-value
//!   persistence layer with secure-preferred backend fallback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use anonkit_core::store::MemoryStore;
//! use anonkit_core::{EnvDeviceInfo, SessionManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), anonkit_core::IdentityError> {
//! let manager = SessionManager::new(Arc::new(MemoryStore::new()), Arc::new(EnvDeviceInfo));
//!
//! let session = manager.initialize_user().await?;
//! assert!(session.is_first_login);
//!
//! let credentials = manager.get_user_credentials().await?.expect("just created");
//! assert!(manager
//!     .authenticate_user(&credentials.username, &credentials.passphrase)
//!     .await?);
//! # Ok(())
//! # }
//! ```

pub use anonkit_store as store;

pub mod defaults;
mod device;
mod error;
mod generate;
mod hasher;
mod manager;
mod session;

pub use device::{DeviceAttributes, DeviceIdentity, DeviceInfoProvider, EnvDeviceInfo};
pub use error::IdentityError;
pub use generate::{generate_passphrase, generate_username};
pub use hasher::{generate_salt, hash_passphrase, verify_passphrase};
pub use manager::SessionManager;
pub use session::{CredentialRecord, CredentialView, Session};
