//! In-memory master key repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::master_key::{MasterKey, MasterKeyRepository};
use crate::domain::DomainError;

/// In-memory implementation of MasterKeyRepository
#[derive(Debug)]
pub struct InMemoryMasterKeyRepository {
    keys: Arc<RwLock<HashMap<i64, MasterKey>>>,
    next_id: AtomicI64,
}

impl InMemoryMasterKeyRepository {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryMasterKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MasterKeyRepository for InMemoryMasterKeyRepository {
    async fn get(&self, id: i64) -> Result<Option<MasterKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(&id).cloned())
    }

    async fn find_active_by_digest(&self, digest: &str) -> Result<Option<MasterKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys
            .values()
            .find(|k| k.is_active() && k.key_digest() == digest)
            .cloned())
    }

    async fn create(&self, key: MasterKey) -> Result<MasterKey, DomainError> {
        let mut keys = self.keys.write().await;

        if keys.values().any(|k| k.key_digest() == key.key_digest()) {
            return Err(DomainError::conflict("Master key digest already exists"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let key = key.with_id(id);
        keys.insert(id, key.clone());

        Ok(key)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;

        match keys.get_mut(&id) {
            Some(key) => {
                key.set_active(is_active);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        if let Some(key) = keys.get_mut(&id) {
            key.record_usage(at);
        }

        Ok(())
    }

    async fn any_active(&self) -> Result<bool, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.values().any(MasterKey::is_active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(digest: &str) -> MasterKey {
        MasterKey::new("Key", digest)
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryMasterKeyRepository::new();

        let first = repo.create(key("d1")).await.unwrap();
        let second = repo.create(key("d2")).await.unwrap();

        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(repo.get(2).await.unwrap().unwrap().key_digest(), "d2");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_digest() {
        let repo = InMemoryMasterKeyRepository::new();
        repo.create(key("same")).await.unwrap();

        let result = repo.create(key("same")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_find_active_by_digest_skips_inactive() {
        let repo = InMemoryMasterKeyRepository::new();
        let created = repo.create(key("d1")).await.unwrap();

        assert!(repo.find_active_by_digest("d1").await.unwrap().is_some());

        repo.set_active(created.id(), false).await.unwrap();
        assert!(repo.find_active_by_digest("d1").await.unwrap().is_none());
        assert!(repo.find_active_by_digest("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_active_on_missing_key() {
        let repo = InMemoryMasterKeyRepository::new();
        assert!(!repo.set_active(99, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_last_used() {
        let repo = InMemoryMasterKeyRepository::new();
        let created = repo.create(key("d1")).await.unwrap();
        let at = Utc::now();

        repo.touch_last_used(created.id(), at).await.unwrap();

        let stored = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(stored.last_used_at(), Some(at));
    }

    #[tokio::test]
    async fn test_any_active() {
        let repo = InMemoryMasterKeyRepository::new();
        assert!(!repo.any_active().await.unwrap());

        let created = repo.create(key("d1")).await.unwrap();
        assert!(repo.any_active().await.unwrap());

        repo.set_active(created.id(), false).await.unwrap();
        assert!(!repo.any_active().await.unwrap());
    }
}
