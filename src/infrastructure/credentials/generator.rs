//! Credential generation
//!
//! Produces master key and API token plaintexts from an injected
//! cryptographically secure RNG.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use super::hasher::SecretHasher;

/// Prefix of every master key
pub const MASTER_KEY_PREFIX: &str = "mk_";

const MASTER_KEY_RANDOM_LEN: usize = 60;
const API_TOKEN_SEED_LEN: usize = 40;

/// RNG usable by [`CredentialGenerator`]
pub trait SecureRng: RngCore + CryptoRng + Send {}

impl<T: RngCore + CryptoRng + Send> SecureRng for T {}

/// A freshly generated secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSecret {
    /// Shown to the caller exactly once
    pub plaintext: String,
    /// What gets stored
    pub digest: String,
}

impl GeneratedSecret {
    /// Wrap a known plaintext (seeding and tests)
    pub fn from_plaintext(plaintext: impl Into<String>) -> Self {
        let plaintext = plaintext.into();
        let digest = SecretHasher::digest(&plaintext);
        Self { plaintext, digest }
    }
}

/// Generator for master keys and API tokens
pub struct CredentialGenerator<R = Box<dyn SecureRng>> {
    rng: Mutex<R>,
}

impl<R: RngCore + CryptoRng> CredentialGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// `mk_` followed by 60 alphanumeric characters
    pub fn master_key(&self) -> GeneratedSecret {
        let random = self.random_alphanumeric(MASTER_KEY_RANDOM_LEN);
        GeneratedSecret::from_plaintext(format!("{}{}", MASTER_KEY_PREFIX, random))
    }

    /// 64 hex characters: the digest of 40 random alphanumeric characters
    pub fn api_token(&self) -> GeneratedSecret {
        let seed = self.random_alphanumeric(API_TOKEN_SEED_LEN);
        GeneratedSecret::from_plaintext(SecretHasher::digest(&seed))
    }

    pub fn random_alphanumeric(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// `bytes` random bytes, hex encoded
    pub fn random_hex(&self, bytes: usize) -> String {
        let mut buffer = vec![0u8; bytes];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut buffer);
        hex::encode(buffer)
    }
}

impl CredentialGenerator {
    /// Generator backed by any secure RNG, boxed
    pub fn boxed(rng: impl SecureRng + 'static) -> Self {
        Self::new(Box::new(rng) as Box<dyn SecureRng>)
    }
}

impl Default for CredentialGenerator {
    fn default() -> Self {
        Self::boxed(OsRng)
    }
}

impl<R> fmt::Debug for CredentialGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> CredentialGenerator<StdRng> {
        CredentialGenerator::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_master_key_shape() {
        let secret = seeded(1).master_key();

        assert!(secret.plaintext.starts_with("mk_"));
        assert_eq!(secret.plaintext.len(), 63);
        assert!(secret.plaintext[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(secret.digest, SecretHasher::digest(&secret.plaintext));
    }

    #[test]
    fn test_api_token_shape() {
        let secret = seeded(1).api_token();

        assert_eq!(secret.plaintext.len(), 64);
        assert!(secret.plaintext.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(secret.digest, SecretHasher::digest(&secret.plaintext));
        assert_ne!(secret.digest, secret.plaintext);
    }

    #[test]
    fn test_seeded_generators_are_deterministic() {
        assert_eq!(seeded(42).master_key(), seeded(42).master_key());
        assert_ne!(seeded(42).api_token(), seeded(43).api_token());
    }

    #[test]
    fn test_consecutive_secrets_differ() {
        let generator = CredentialGenerator::default();
        assert_ne!(generator.api_token(), generator.api_token());
        assert_ne!(generator.master_key(), generator.master_key());
    }

    #[test]
    fn test_random_hex_length() {
        let hex = seeded(7).random_hex(20);
        assert_eq!(hex.len(), 40);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_boxed_generator() {
        let generator = CredentialGenerator::boxed(StdRng::seed_from_u64(9));
        assert_eq!(generator.master_key(), seeded(9).master_key());
    }
}
