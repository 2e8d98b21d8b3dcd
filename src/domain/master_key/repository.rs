//! Master key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::MasterKey;
use crate::domain::DomainError;

/// Persistence for master keys
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MasterKeyRepository: Send + Sync {
    /// Get a master key by its ID
    async fn get(&self, id: i64) -> Result<Option<MasterKey>, DomainError>;

    /// Find an active master key by the digest of its plaintext
    async fn find_active_by_digest(&self, digest: &str) -> Result<Option<MasterKey>, DomainError>;

    /// Persist a new master key, assigning its ID
    ///
    /// Fails with a conflict when the digest is already stored.
    async fn create(&self, key: MasterKey) -> Result<MasterKey, DomainError>;

    /// Flip the active flag; returns false when no such key exists
    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError>;

    /// Record the last time the key authenticated a request
    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Whether at least one master key has the active flag set
    async fn any_active(&self) -> Result<bool, DomainError>;
}
