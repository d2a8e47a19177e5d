//! Master recovery codes.
//!
//! DDD: Value object mirroring `Password`: the plaintext exists only at
//! generation and verification time, the hash is what gets stored.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::{SECRET_CODE_ALPHABET, SECRET_CODE_LENGTH, SECRET_CODE_VALIDITY_DAYS};
use crate::errors::AppResult;

use super::password::{hash_plaintext, verify_plaintext};

/// A hashed recovery code.
#[derive(Clone)]
pub struct SecretCode {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for SecretCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCode")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl SecretCode {
    /// Generate a fresh plaintext code from the unambiguous alphabet.
    ///
    /// Uses the thread-local CSPRNG. The caller shows the plaintext to
    /// the account holder exactly once and stores only the hash.
    pub fn generate() -> String {
        let mut rng = rand::rng();
        (0..SECRET_CODE_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..SECRET_CODE_ALPHABET.len());
                SECRET_CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    /// Hash a plaintext code for storage.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        let hash = hash_plaintext(plain_text)?;
        Ok(Self { hash })
    }

    /// Wrap an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Verify a plaintext code against this hash. Fails closed on any
    /// malformed hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        verify_plaintext(plain_text, &self.hash)
    }
}

/// Check whether a code issued at `created_at` has outlived its validity
/// window as of `now`.
pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::days(SECRET_CODE_VALIDITY_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let code = SecretCode::generate();
        assert_eq!(code.len(), SECRET_CODE_LENGTH);
        assert!(code.bytes().all(|b| SECRET_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ambiguous_characters_never_appear() {
        // 0, O, I and 1 are excluded from the alphabet
        for _ in 0..50 {
            let code = SecretCode::generate();
            assert!(!code.contains(['0', 'O', 'I', '1']));
        }
    }

    #[test]
    fn test_generated_codes_are_distinct() {
        let first = SecretCode::generate();
        let second = SecretCode::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn test_round_trip_verification() {
        let plain = SecretCode::generate();
        let code = SecretCode::new(&plain).unwrap();

        assert!(code.verify(&plain));
    }

    #[test]
    fn test_single_character_perturbation_fails() {
        let plain = SecretCode::generate();
        let code = SecretCode::new(&plain).unwrap();

        let mut bytes = plain.clone().into_bytes();
        // Swap the first character for a different alphabet member
        let replacement = SECRET_CODE_ALPHABET
            .iter()
            .copied()
            .find(|&b| b != bytes[0])
            .unwrap();
        bytes[0] = replacement;
        let perturbed = String::from_utf8(bytes).unwrap();

        assert!(!code.verify(&perturbed));
    }

    #[test]
    fn test_restored_hash_still_verifies() {
        let plain = SecretCode::generate();
        let stored = SecretCode::new(&plain).unwrap().as_str().to_string();

        let restored = SecretCode::from_hash(stored);
        assert!(restored.verify(&plain));
    }

    #[test]
    fn test_expiry_boundaries() {
        let now = Utc::now();

        let at_89_days = now - Duration::days(89);
        assert!(!is_expired(at_89_days, now));

        let at_91_days = now - Duration::days(91);
        assert!(is_expired(at_91_days, now));
    }

    #[test]
    fn test_fresh_code_is_not_expired() {
        let now = Utc::now();
        assert!(!is_expired(now, now));
    }
}
