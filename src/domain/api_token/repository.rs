//! API token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::ApiToken;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::DomainError;

/// Persistence for API tokens
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiTokenRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<ApiToken>, DomainError>;

    /// Look a token up by digest regardless of its active flag
    async fn find_by_digest(&self, digest: &str) -> Result<Option<ApiToken>, DomainError>;

    /// Persist a new token, assigning its ID
    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError>;

    /// Replace the stored state of an existing token
    async fn update(&self, token: &ApiToken) -> Result<ApiToken, DomainError>;

    /// Hard delete; returns false when nothing was removed
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;

    /// Newest first (created_at desc, then id desc)
    async fn list_page(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError>;

    /// Returns false when no such token exists
    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError>;

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError>;
}
