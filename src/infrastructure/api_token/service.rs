//! API token service
//!
//! Bearer authentication plus the token management operations.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::api_token::{ApiToken, ApiTokenChanges, ApiTokenRepository, NewApiToken};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{AuthError, DomainError};
use crate::infrastructure::credentials::{CredentialGenerator, GeneratedSecret, SecretHasher};

use super::rate_limiter::{RateLimitResult, RateLimiter};

/// Result of creating a new API token
#[derive(Debug)]
pub struct CreatedApiToken {
    pub token: ApiToken,
    /// Plaintext bearer value, only available here
    pub plaintext: String,
}

fn token_not_found() -> DomainError {
    DomainError::not_found("Token not found")
}

/// API token service
#[derive(Debug)]
pub struct ApiTokenService<R: ApiTokenRepository + ?Sized> {
    repository: Arc<R>,
    generator: Arc<CredentialGenerator>,
    rate_limiter: Arc<RateLimiter>,
}

impl<R: ApiTokenRepository + ?Sized> ApiTokenService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: Arc::new(CredentialGenerator::default()),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<CredentialGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Resolve a bearer value to a usable token
    ///
    /// On success `last_used_at` is stamped before the token is returned.
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
        request_ip: Option<IpAddr>,
    ) -> Result<ApiToken, AuthError> {
        let bearer = match bearer.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingCredential),
        };

        let digest = SecretHasher::digest(bearer);

        let Some(mut token) = self.repository.find_by_digest(&digest).await? else {
            debug!("Bearer token does not match any stored token");
            return Err(AuthError::InvalidOrExpired);
        };

        if !token.is_valid() {
            debug!(token_id = token.id(), active = token.is_active(), "Token is inactive or expired");
            return Err(AuthError::InvalidOrExpired);
        }

        if !token.allows_ip(request_ip) {
            warn!(
                token_id = token.id(),
                ip = ?request_ip,
                "Token used from a non-allowed IP"
            );
            return Err(AuthError::IpForbidden);
        }

        let now = Utc::now();
        self.repository.touch_last_used(token.id(), now).await?;
        token.record_usage(now);

        Ok(token)
    }

    /// Count one request against the token's per-minute limit
    pub async fn check_rate_limit(&self, token: &ApiToken) -> RateLimitResult {
        self.rate_limiter
            .check_and_record(&token.id().to_string(), token.rate_limit())
            .await
    }

    /// Create a token with a freshly generated secret
    pub async fn create(&self, draft: NewApiToken) -> Result<CreatedApiToken, DomainError> {
        let secret = self.generator.api_token();
        self.store(draft, secret).await
    }

    /// Create a token whose plaintext is already known (seeding)
    pub async fn create_with_plaintext(
        &self,
        draft: NewApiToken,
        plaintext: &str,
    ) -> Result<CreatedApiToken, DomainError> {
        self.store(draft, GeneratedSecret::from_plaintext(plaintext))
            .await
    }

    async fn store(
        &self,
        draft: NewApiToken,
        secret: GeneratedSecret,
    ) -> Result<CreatedApiToken, DomainError> {
        info!(name = %draft.name, "Creating API token");

        let token = self
            .repository
            .create(draft.into_token(&secret.digest))
            .await?;

        info!(token_id = token.id(), "API token created");

        Ok(CreatedApiToken {
            token,
            plaintext: secret.plaintext,
        })
    }

    pub async fn get(&self, id: i64) -> Result<ApiToken, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(token_not_found)
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError> {
        self.repository.list_page(request).await
    }

    pub async fn update(&self, id: i64, changes: ApiTokenChanges) -> Result<ApiToken, DomainError> {
        info!(token_id = id, "Updating API token");

        let mut token = self.get(id).await?;
        let rate_limit_changed = changes.rate_limit.is_some();

        token.apply(changes);
        let token = self.repository.update(&token).await?;

        if rate_limit_changed {
            self.rate_limiter.reset(&id.to_string()).await;
        }

        Ok(token)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        info!(token_id = id, "Deleting API token");

        if !self.repository.delete(id).await? {
            return Err(token_not_found());
        }

        self.rate_limiter.reset(&id.to_string()).await;
        Ok(())
    }

    /// Deactivate a token; revoking twice is fine
    pub async fn revoke(&self, id: i64) -> Result<(), DomainError> {
        info!(token_id = id, "Revoking API token");
        self.set_active(id, false).await
    }

    pub async fn activate(&self, id: i64) -> Result<(), DomainError> {
        info!(token_id = id, "Activating API token");
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<(), DomainError> {
        if self.repository.set_active(id, is_active).await? {
            Ok(())
        } else {
            Err(token_not_found())
        }
    }
}
