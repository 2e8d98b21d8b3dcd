//! Application state for shared services

use std::net::IpAddr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{
    ApiToken, ApiTokenChanges, ApiTokenRepository, AuthError, DomainError, ErpGateway, MasterKey,
    MasterKeyRepository, NewApiToken, Page, PageRequest, DEFAULT_RATE_LIMIT,
};
use crate::infrastructure::api_token::{ApiTokenService, CreatedApiToken, RateLimitResult};
use crate::infrastructure::master_key::MasterKeyService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub master_key_service: Arc<dyn MasterKeyServiceTrait>,
    pub api_token_service: Arc<dyn ApiTokenServiceTrait>,
    pub erp_gateway: Arc<dyn ErpGateway>,
    pub settings: ApiSettings,
}

/// Request-time knobs taken from [`AppConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    pub page_size: u64,
    pub default_rate_limit: u32,
    pub rate_limiting_enabled: bool,
    /// Read the client IP from `X-Forwarded-For`
    pub trust_forwarded_for: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_rate_limit: DEFAULT_RATE_LIMIT,
            rate_limiting_enabled: true,
            trust_forwarded_for: false,
        }
    }
}

impl From<&AppConfig> for ApiSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.tokens.page_size.max(1),
            default_rate_limit: config.tokens.default_rate_limit.max(1),
            rate_limiting_enabled: config.tokens.rate_limiting_enabled,
            trust_forwarded_for: config.server.trust_forwarded_for,
        }
    }
}

/// Master key operations needed by the request pipeline
#[async_trait::async_trait]
pub trait MasterKeyServiceTrait: Send + Sync {
    async fn find_valid_key(&self, plaintext: &str) -> Result<Option<MasterKey>, DomainError>;
    async fn touch(&self, id: i64);
}

/// API token operations needed by the middleware and admin handlers
#[async_trait::async_trait]
pub trait ApiTokenServiceTrait: Send + Sync {
    async fn authenticate(
        &self,
        bearer: Option<&str>,
        request_ip: Option<IpAddr>,
    ) -> Result<ApiToken, AuthError>;
    async fn check_rate_limit(&self, token: &ApiToken) -> RateLimitResult;
    async fn create(&self, draft: NewApiToken) -> Result<CreatedApiToken, DomainError>;
    async fn get(&self, id: i64) -> Result<ApiToken, DomainError>;
    async fn list(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError>;
    async fn update(&self, id: i64, changes: ApiTokenChanges) -> Result<ApiToken, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn revoke(&self, id: i64) -> Result<(), DomainError>;
    async fn activate(&self, id: i64) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
impl<R: MasterKeyRepository + ?Sized + 'static> MasterKeyServiceTrait for MasterKeyService<R> {
    async fn find_valid_key(&self, plaintext: &str) -> Result<Option<MasterKey>, DomainError> {
        MasterKeyService::find_valid_key(self, plaintext).await
    }

    async fn touch(&self, id: i64) {
        MasterKeyService::touch(self, id).await
    }
}

#[async_trait::async_trait]
impl<R: ApiTokenRepository + ?Sized + 'static> ApiTokenServiceTrait for ApiTokenService<R> {
    async fn authenticate(
        &self,
        bearer: Option<&str>,
        request_ip: Option<IpAddr>,
    ) -> Result<ApiToken, AuthError> {
        ApiTokenService::authenticate(self, bearer, request_ip).await
    }

    async fn check_rate_limit(&self, token: &ApiToken) -> RateLimitResult {
        ApiTokenService::check_rate_limit(self, token).await
    }

    async fn create(&self, draft: NewApiToken) -> Result<CreatedApiToken, DomainError> {
        ApiTokenService::create(self, draft).await
    }

    async fn get(&self, id: i64) -> Result<ApiToken, DomainError> {
        ApiTokenService::get(self, id).await
    }

    async fn list(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError> {
        ApiTokenService::list(self, request).await
    }

    async fn update(&self, id: i64, changes: ApiTokenChanges) -> Result<ApiToken, DomainError> {
        ApiTokenService::update(self, id, changes).await
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        ApiTokenService::delete(self, id).await
    }

    async fn revoke(&self, id: i64) -> Result<(), DomainError> {
        ApiTokenService::revoke(self, id).await
    }

    async fn activate(&self, id: i64) -> Result<(), DomainError> {
        ApiTokenService::activate(self, id).await
    }
}

impl AppState {
    pub fn new(
        master_key_service: Arc<dyn MasterKeyServiceTrait>,
        api_token_service: Arc<dyn ApiTokenServiceTrait>,
        erp_gateway: Arc<dyn ErpGateway>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            master_key_service,
            api_token_service,
            erp_gateway,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = AppConfig::default();
        config.tokens.page_size = 0;
        config.tokens.rate_limiting_enabled = false;
        config.server.trust_forwarded_for = true;

        let settings = ApiSettings::from(&config);
        assert_eq!(settings.page_size, 1);
        assert!(!settings.rate_limiting_enabled);
        assert!(settings.trust_forwarded_for);
        assert_eq!(settings.default_rate_limit, 60);
    }
}
