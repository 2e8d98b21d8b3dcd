//! Master key domain
//!
//! The master key is the high-privilege credential that authorizes API token
//! management. Keys are never rotated in place: a new key is created and the
//! old one deactivated.

mod entity;
mod repository;

pub use entity::{MasterKey, MasterKeyView};
pub use repository::MasterKeyRepository;

#[cfg(test)]
pub use repository::MockMasterKeyRepository;
