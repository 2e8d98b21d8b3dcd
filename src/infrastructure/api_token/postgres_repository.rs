//! PostgreSQL API token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::api_token::{ApiToken, ApiTokenRepository};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::DomainError;

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, token, abilities, last_used_at, expires_at, is_active,
           ip_restriction, rate_limit, metadata, created_at, updated_at
    FROM api_tokens
"#;

/// PostgreSQL implementation of ApiTokenRepository
#[derive(Debug, Clone)]
pub struct PostgresApiTokenRepository {
    pool: PgPool,
}

impl PostgresApiTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    let msg = e.to_string();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

#[async_trait]
impl ApiTokenRepository for PostgresApiTokenRepository {
    async fn get(&self, id: i64) -> Result<Option<ApiToken>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get API token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn find_by_digest(&self, digest: &str) -> Result<Option<ApiToken>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE token = $1", SELECT_COLUMNS))
            .bind(digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to find API token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO api_tokens (name, token, abilities, last_used_at, expires_at, is_active,
                                    ip_restriction, rate_limit, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(token.name())
        .bind(token.token_digest())
        .bind(token.abilities().map(Json))
        .bind(token.last_used_at())
        .bind(token.expires_at())
        .bind(token.is_active())
        .bind(token.ip_restriction())
        .bind(token.rate_limit() as i32)
        .bind(token.metadata())
        .bind(token.created_at())
        .bind(token.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("API token digest already exists")
            } else {
                DomainError::storage(format!("Failed to create API token: {}", e))
            }
        })?;

        Ok(token.with_id(id))
    }

    async fn update(&self, token: &ApiToken) -> Result<ApiToken, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE api_tokens
            SET name = $2, abilities = $3, expires_at = $4, is_active = $5,
                ip_restriction = $6, rate_limit = $7, metadata = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(token.id())
        .bind(token.name())
        .bind(token.abilities().map(Json))
        .bind(token.expires_at())
        .bind(token.is_active())
        .bind(token.ip_restriction())
        .bind(token.rate_limit() as i32)
        .bind(token.metadata())
        .bind(token.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update API token: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "API token '{}' not found",
                token.id()
            )));
        }

        Ok(token.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_page(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count API tokens: {}", e)))?;

        let rows = sqlx::query(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            SELECT_COLUMNS
        ))
        .bind(request.per_page() as i64)
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API tokens: {}", e)))?;

        let mut tokens = Vec::with_capacity(rows.len());

        for row in rows {
            tokens.push(row_to_token(&row)?);
        }

        Ok(Page::new(tokens, total.max(0) as u64, request))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE api_tokens SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update API token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE api_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record API token usage: {}", e)))?;

        Ok(())
    }
}

fn row_to_token(row: &sqlx::postgres::PgRow) -> Result<ApiToken, DomainError> {
    let map_err = |e: sqlx::Error| DomainError::storage(format!("Invalid API token row: {}", e));

    let id: i64 = row.try_get("id").map_err(map_err)?;
    let name: String = row.try_get("name").map_err(map_err)?;
    let digest: String = row.try_get("token").map_err(map_err)?;
    let abilities: Option<Json<Vec<String>>> = row.try_get("abilities").map_err(map_err)?;
    let last_used_at: Option<DateTime<Utc>> = row.try_get("last_used_at").map_err(map_err)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(map_err)?;
    let is_active: bool = row.try_get("is_active").map_err(map_err)?;
    let ip_restriction: Option<String> = row.try_get("ip_restriction").map_err(map_err)?;
    let rate_limit: i32 = row.try_get("rate_limit").map_err(map_err)?;
    let metadata: Option<serde_json::Value> = row.try_get("metadata").map_err(map_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_err)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_err)?;

    let rate_limit = u32::try_from(rate_limit)
        .map_err(|_| DomainError::storage(format!("Invalid rate limit in database: {}", rate_limit)))?;

    Ok(ApiToken::new(name, digest)
        .with_id(id)
        .with_abilities(abilities.map(|Json(list)| list))
        .with_last_used_at(last_used_at)
        .with_expiration(expires_at)
        .with_active(is_active)
        .with_ip_restriction(ip_restriction)
        .with_rate_limit(rate_limit)
        .with_metadata(metadata)
        .with_timestamps(created_at, updated_at))
}
