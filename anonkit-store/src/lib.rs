//! Key-value persistence primitives for anonkit.
//!
//! Everything the identity core persists goes through the [`KeyValueStore`]
//! trait: three string-keyed, JSON-encoded records (device fingerprint, user
//! session, credential record). The storage layer never interprets record
//! contents.
//!
//! # Backends
//!
//! Platform integrations provide the preferred backend by implementing
//! [`KeyValueStore`] over whatever secure store the host offers:
//!
//! - iOS: Keychain Services
//! - Android: `EncryptedSharedPreferences` / Android Keystore
//! - Web: no secure store; use the plain backend directly
//!
//! This crate ships two concrete backends — [`MemoryStore`] for tests and
//! ephemeral hosts, and [`FileStore`] as a plain persistent fallback — plus
//! [`FallbackStore`], which prefers the secure backend and falls back to the
//! plain one when an operation fails.
//!
//! Values stored through the fallback path are at rest unencrypted; callers
//! that persist secrets must treat them accordingly.

mod backend;
mod error;
mod fallback;
mod file;
mod memory;

pub use backend::KeyValueStore;
pub use error::StoreError;
pub use fallback::FallbackStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
