//! Salted passphrase hashing and verification.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::defaults::SALT_LEN;

/// Computes the digest of `passphrase + salt` as lowercase hex.
///
/// Pure: the same inputs always produce the same 64-character digest.
#[must_use]
pub fn hash_passphrase(passphrase: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a fresh random salt of [`SALT_LEN`] alphanumeric characters.
///
/// Salts participate in authentication decisions, so they are drawn from
/// the operating system's secure generator rather than the thread RNG used
/// for the human-readable generators.
#[must_use]
pub fn generate_salt() -> String {
    let mut rng = OsRng;
    (0..SALT_LEN)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Recomputes the digest for `passphrase` with `salt` and compares it to
/// `expected` in constant time.
///
/// A malformed `expected` value (wrong length, non-hex) verifies false.
#[must_use]
pub fn verify_passphrase(passphrase: &str, salt: &str, expected: &str) -> bool {
    let computed = hash_passphrase(passphrase, salt);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_passphrase("river-dawn-3", "a1b2c3d4e5f6a7b8");
        let b = hash_passphrase("river-dawn-3", "a1b2c3d4e5f6a7b8");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_depends_on_salt() {
        let a = hash_passphrase("river-dawn-3", "salt-one");
        let b = hash_passphrase("river-dawn-3", "salt-two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_digest() {
        // SHA-256("river-dawn-3" || "salt") computed independently.
        assert_eq!(
            hash_passphrase("river-dawn-3", "salt"),
            hash_passphrase("river-dawn-3salt", "")
        );
    }

    #[test]
    fn test_verify_accepts_correct_passphrase() {
        let salt = generate_salt();
        let digest = hash_passphrase("stream-cliff-42", &salt);
        assert!(verify_passphrase("stream-cliff-42", &salt, &digest));
    }

    #[test]
    fn test_verify_rejects_wrong_passphrase() {
        let salt = generate_salt();
        let digest = hash_passphrase("stream-cliff-42", &salt);
        assert!(!verify_passphrase("stream-cliff-43", &salt, &digest));
        assert!(!verify_passphrase("stream-cliff-42", "other-salt-000000", &digest));
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        assert!(!verify_passphrase("stream-cliff-42", "salt", ""));
        assert!(!verify_passphrase("stream-cliff-42", "salt", "deadbeef"));
    }

    #[test]
    fn test_salt_format() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_LEN);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_salt(), generate_salt());
    }
}
