//! Secret hashing and generation

mod generator;
mod hasher;

pub use generator::{CredentialGenerator, GeneratedSecret, SecureRng, MASTER_KEY_PREFIX};
pub use hasher::SecretHasher;
