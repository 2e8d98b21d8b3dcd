//! Master key service
//!
//! Validates presented master keys and creates new ones.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::master_key::{MasterKey, MasterKeyRepository};
use crate::domain::DomainError;
use crate::infrastructure::credentials::{CredentialGenerator, SecretHasher};

/// Result of creating a new master key
#[derive(Debug)]
pub struct CreatedMasterKey {
    pub key: MasterKey,
    /// Plaintext key, only available here
    pub plaintext: String,
}

/// Master key service
#[derive(Debug)]
pub struct MasterKeyService<R: MasterKeyRepository + ?Sized> {
    repository: Arc<R>,
    generator: Arc<CredentialGenerator>,
}

impl<R: MasterKeyRepository + ?Sized> MasterKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: Arc::new(CredentialGenerator::default()),
        }
    }

    /// Use a specific generator (seeded RNG in tests)
    pub fn with_generator(mut self, generator: Arc<CredentialGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Resolve a plaintext master key to an active, unexpired record
    pub async fn find_valid_key(&self, plaintext: &str) -> Result<Option<MasterKey>, DomainError> {
        let digest = SecretHasher::digest(plaintext);

        let Some(key) = self.repository.find_active_by_digest(&digest).await? else {
            debug!("No active master key matches the presented value");
            return Ok(None);
        };

        if !key.is_valid() {
            debug!(key_id = key.id(), "Master key is expired");
            return Ok(None);
        }

        Ok(Some(key))
    }

    /// Stamp `last_used_at`; failures are logged, never surfaced
    pub async fn touch(&self, id: i64) {
        if let Err(e) = self.repository.touch_last_used(id, Utc::now()).await {
            warn!(key_id = id, "Failed to record master key usage: {}", e);
        }
    }

    /// Generate and persist a new master key
    pub async fn create(
        &self,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
        created_by: &str,
        metadata: Option<Value>,
    ) -> Result<CreatedMasterKey, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Master key name must not be empty"));
        }

        let secret = self.generator.master_key();

        let mut key = MasterKey::new(name, &secret.digest)
            .with_expiration(expires_at)
            .with_created_by(created_by);
        if let Some(metadata) = metadata {
            key = key.with_metadata(metadata);
        }

        let key = self.repository.create(key).await?;

        info!(key_id = key.id(), name = %key.name(), created_by, "Master key created");

        Ok(CreatedMasterKey {
            key,
            plaintext: secret.plaintext,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<MasterKey>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn has_active_key(&self) -> Result<bool, DomainError> {
        self.repository.any_active().await
    }

    /// Activate or deactivate a key
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<(), DomainError> {
        info!(key_id = id, is_active, "Changing master key status");

        if !self.repository.set_active(id, is_active).await? {
            return Err(DomainError::not_found(format!("Master key '{}' not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::master_key::MockMasterKeyRepository;
    use crate::infrastructure::master_key::InMemoryMasterKeyRepository;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_service() -> MasterKeyService<InMemoryMasterKeyRepository> {
        let generator = CredentialGenerator::boxed(StdRng::seed_from_u64(11));
        MasterKeyService::new(Arc::new(InMemoryMasterKeyRepository::new()))
            .with_generator(Arc::new(generator))
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let service = create_service();
        let created = service.create("Ops", None, "tests", None).await.unwrap();

        assert!(created.plaintext.starts_with("mk_"));
        assert_eq!(created.key.key_digest(), SecretHasher::digest(&created.plaintext));
        assert_eq!(created.key.created_by(), Some("tests"));

        let found = service.find_valid_key(&created.plaintext).await.unwrap();
        assert_eq!(found.map(|k| k.id()), Some(created.key.id()));
    }

    #[tokio::test]
    async fn test_find_unknown_key() {
        let service = create_service();
        service.create("Ops", None, "tests", None).await.unwrap();

        assert!(service.find_valid_key("mk_nope").await.unwrap().is_none());
        assert!(service.find_valid_key("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_key_is_not_valid() {
        let service = create_service();
        let created = service
            .create("Old", Some(Utc::now() - Duration::hours(1)), "tests", None)
            .await
            .unwrap();

        assert!(service.find_valid_key(&created.plaintext).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_key_is_not_found() {
        let service = create_service();
        let created = service.create("Ops", None, "tests", None).await.unwrap();

        service.set_active(created.key.id(), false).await.unwrap();

        assert!(service.find_valid_key(&created.plaintext).await.unwrap().is_none());
        assert!(!service.has_active_key().await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_sets_last_used() {
        let service = create_service();
        let created = service.create("Ops", None, "tests", None).await.unwrap();

        service.touch(created.key.id()).await;

        let stored = service.get(created.key.id()).await.unwrap().unwrap();
        assert!(stored.last_used_at().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let service = create_service();
        let result = service.create("  ", None, "tests", None).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_set_active_missing_key() {
        let service = create_service();
        let result = service.set_active(404, true).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut repo = MockMasterKeyRepository::new();
        repo.expect_find_active_by_digest()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = MasterKeyService::new(Arc::new(repo));
        let result = service.find_valid_key("mk_anything").await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_touch_swallows_storage_failure() {
        let mut repo = MockMasterKeyRepository::new();
        repo.expect_touch_last_used()
            .times(1)
            .returning(|_, _| Err(DomainError::storage("read only")));

        let service = MasterKeyService::new(Arc::new(repo));
        service.touch(1).await;
    }
}
