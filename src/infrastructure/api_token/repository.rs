//! In-memory API token repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::api_token::{ApiToken, ApiTokenRepository};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::DomainError;

/// In-memory implementation of ApiTokenRepository
#[derive(Debug)]
pub struct InMemoryApiTokenRepository {
    tokens: Arc<RwLock<HashMap<i64, ApiToken>>>,
    next_id: AtomicI64,
}

impl InMemoryApiTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryApiTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: i64) -> DomainError {
    DomainError::not_found(format!("API token '{}' not found", id))
}

#[async_trait]
impl ApiTokenRepository for InMemoryApiTokenRepository {
    async fn get(&self, id: i64) -> Result<Option<ApiToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&id).cloned())
    }

    async fn find_by_digest(&self, digest: &str) -> Result<Option<ApiToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token_digest() == digest).cloned())
    }

    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.values().any(|t| t.token_digest() == token.token_digest()) {
            return Err(DomainError::conflict("API token digest already exists"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = token.with_id(id);
        tokens.insert(id, token.clone());

        Ok(token)
    }

    async fn update(&self, token: &ApiToken) -> Result<ApiToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(&token.id()) {
            Some(stored) => {
                *stored = token.clone();
                Ok(token.clone())
            }
            None => Err(not_found(token.id())),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.remove(&id).is_some())
    }

    async fn list_page(&self, request: PageRequest) -> Result<Page<ApiToken>, DomainError> {
        let tokens = self.tokens.read().await;

        let mut all: Vec<&ApiToken> = tokens.values().collect();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.per_page() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, tokens.len() as u64, request))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(&id) {
            Some(token) => {
                token.set_active(is_active);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;

        if let Some(token) = tokens.get_mut(&id) {
            token.record_usage(at);
        }

        Ok(())
    }
}
