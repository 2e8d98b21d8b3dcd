//! PostgreSQL master key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::master_key::{MasterKey, MasterKeyRepository};
use crate::domain::DomainError;

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, key, is_active, expires_at, last_used_at, created_by,
           metadata, created_at, updated_at
    FROM master_keys
"#;

/// PostgreSQL implementation of MasterKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresMasterKeyRepository {
    pool: PgPool,
}

impl PostgresMasterKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MasterKeyRepository for PostgresMasterKeyRepository {
    async fn get(&self, id: i64) -> Result<Option<MasterKey>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get master key: {}", e)))?;

        row.as_ref().map(row_to_master_key).transpose()
    }

    async fn find_active_by_digest(&self, digest: &str) -> Result<Option<MasterKey>, DomainError> {
        let row = sqlx::query(&format!(
            "{} WHERE key = $1 AND is_active = TRUE",
            SELECT_COLUMNS
        ))
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find master key: {}", e)))?;

        row.as_ref().map(row_to_master_key).transpose()
    }

    async fn create(&self, key: MasterKey) -> Result<MasterKey, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO master_keys (name, key, is_active, expires_at, last_used_at,
                                     created_by, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(key.name())
        .bind(key.key_digest())
        .bind(key.is_active())
        .bind(key.expires_at())
        .bind(key.last_used_at())
        .bind(key.created_by())
        .bind(key.metadata())
        .bind(key.created_at())
        .bind(key.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict("Master key digest already exists")
            } else {
                DomainError::storage(format!("Failed to create master key: {}", e))
            }
        })?;

        Ok(key.with_id(id))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE master_keys SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update master key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE master_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to record master key usage: {}", e))
            })?;

        Ok(())
    }

    async fn any_active(&self) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM master_keys WHERE is_active = TRUE)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query master keys: {}", e)))
    }
}

fn row_to_master_key(row: &sqlx::postgres::PgRow) -> Result<MasterKey, DomainError> {
    let map_err = |e: sqlx::Error| DomainError::storage(format!("Invalid master key row: {}", e));

    let id: i64 = row.try_get("id").map_err(map_err)?;
    let name: String = row.try_get("name").map_err(map_err)?;
    let digest: String = row.try_get("key").map_err(map_err)?;
    let is_active: bool = row.try_get("is_active").map_err(map_err)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(map_err)?;
    let last_used_at: Option<DateTime<Utc>> = row.try_get("last_used_at").map_err(map_err)?;
    let created_by: Option<String> = row.try_get("created_by").map_err(map_err)?;
    let metadata: Option<serde_json::Value> = row.try_get("metadata").map_err(map_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_err)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_err)?;

    let mut key = MasterKey::new(name, digest)
        .with_id(id)
        .with_active(is_active)
        .with_expiration(expires_at)
        .with_last_used_at(last_used_at)
        .with_timestamps(created_at, updated_at);

    if let Some(created_by) = created_by {
        key = key.with_created_by(created_by);
    }
    if let Some(metadata) = metadata {
        key = key.with_metadata(metadata);
    }

    Ok(key)
}
