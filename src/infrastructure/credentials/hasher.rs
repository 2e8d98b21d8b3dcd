//! One-way hashing of plaintext secrets

use sha2::{Digest, Sha256};

/// SHA-256 hasher for master keys and API tokens
///
/// Digests are unsalted so a presented secret can be looked up by its digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretHasher;

impl SecretHasher {
    /// Lower-case hex SHA-256 of `plaintext` (64 chars)
    pub fn digest(plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            SecretHasher::digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_deterministic_and_hex() {
        let first = SecretHasher::digest("mk_secret");
        let second = SecretHasher::digest("mk_secret");

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_inputs_give_distinct_digests() {
        assert_ne!(SecretHasher::digest("token-a"), SecretHasher::digest("token-b"));
        assert_ne!(SecretHasher::digest(""), SecretHasher::digest(" "));
    }
}
