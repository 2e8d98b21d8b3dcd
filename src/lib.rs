//! ERP API Gateway
//!
//! HTTP gateway in front of the ERP:
//! - master keys authorize API token management
//! - API tokens (SHA-256 digests at rest) authorize the business endpoints
//! - validated order/item payloads are forwarded to ERP stored procedures

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tracing::info;

use api::state::{ApiSettings, AppState};
use config::BackendKind;
use domain::{ApiTokenRepository, ErpGateway, MasterKeyRepository};
use infrastructure::api_token::{ApiTokenService, InMemoryApiTokenRepository, PostgresApiTokenRepository};
use infrastructure::erp::{InMemoryErpGateway, PostgresErpGateway};
use infrastructure::master_key::{
    InMemoryMasterKeyRepository, MasterKeyService, PostgresMasterKeyRepository,
};
use infrastructure::storage::{run_credential_migrations, PostgresConfig};

/// Concrete services shared by the HTTP layer and the CLI commands
#[derive(Clone)]
pub struct Services {
    pub master_keys: Arc<MasterKeyService<dyn MasterKeyRepository>>,
    pub api_tokens: Arc<ApiTokenService<dyn ApiTokenRepository>>,
    pub erp_gateway: Arc<dyn ErpGateway>,
}

impl Services {
    /// Everything in process memory
    pub fn in_memory() -> Self {
        Self::from_repositories(
            Arc::new(InMemoryMasterKeyRepository::new()),
            Arc::new(InMemoryApiTokenRepository::new()),
            Arc::new(InMemoryErpGateway::new()),
        )
    }

    pub fn from_repositories(
        master_keys: Arc<dyn MasterKeyRepository>,
        api_tokens: Arc<dyn ApiTokenRepository>,
        erp_gateway: Arc<dyn ErpGateway>,
    ) -> Self {
        Self {
            master_keys: Arc::new(MasterKeyService::new(master_keys)),
            api_tokens: Arc::new(ApiTokenService::new(api_tokens)),
            erp_gateway,
        }
    }

    pub fn into_state(self, settings: ApiSettings) -> AppState {
        AppState::new(self.master_keys, self.api_tokens, self.erp_gateway, settings)
    }
}

/// Open the credential store pool from configuration
pub async fn connect_credential_store(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config.storage.resolved_database_url().ok_or_else(|| {
        anyhow::anyhow!("storage.database_url or DATABASE_URL is required for the postgres backend")
    })?;

    info!("Connecting to PostgreSQL...");
    let pool = PostgresConfig::new(url)
        .with_max_connections(config.storage.max_connections)
        .connect()
        .await?;
    info!("PostgreSQL connection established");

    Ok(pool)
}

/// Build the services for the configured backends
pub async fn create_services(config: &AppConfig) -> anyhow::Result<Services> {
    info!(
        storage = ?config.storage.backend,
        erp = ?config.erp.backend,
        "Initializing services"
    );

    let credential_pool = match config.storage.backend {
        BackendKind::Postgres => {
            let pool = connect_credential_store(config).await?;
            if config.storage.run_migrations {
                let applied = run_credential_migrations(&pool).await?;
                info!(applied, "Credential migrations checked");
            }
            Some(pool)
        }
        BackendKind::InMemory => None,
    };

    let (master_keys, api_tokens): (Arc<dyn MasterKeyRepository>, Arc<dyn ApiTokenRepository>) =
        match &credential_pool {
            Some(pool) => (
                Arc::new(PostgresMasterKeyRepository::new(pool.clone())),
                Arc::new(PostgresApiTokenRepository::new(pool.clone())),
            ),
            None => (
                Arc::new(InMemoryMasterKeyRepository::new()),
                Arc::new(InMemoryApiTokenRepository::new()),
            ),
        };

    let erp_gateway: Arc<dyn ErpGateway> = match config.erp.backend {
        BackendKind::Postgres => {
            let pool = match (&config.erp.database_url, &credential_pool) {
                (Some(url), _) if !url.is_empty() => PostgresConfig::new(url.clone()).connect().await?,
                (_, Some(pool)) => pool.clone(),
                _ => connect_credential_store(config).await?,
            };
            Arc::new(PostgresErpGateway::new(pool, config.erp.schema.clone()))
        }
        BackendKind::InMemory => Arc::new(InMemoryErpGateway::new()),
    };

    Ok(Services::from_repositories(master_keys, api_tokens, erp_gateway))
}

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let services = create_services(config).await?;
    Ok(services.into_state(ApiSettings::from(config)))
}

/// Build the full router for a state
pub fn create_app(state: AppState) -> Router {
    api::create_router_with_state(state)
}
