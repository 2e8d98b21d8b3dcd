//! ERP gateway trait

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::payload::{ItemPayload, OrderPayload};

/// Failure reported by the ERP (or by the connection to it)
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ErpError {
    message: String,
}

impl ErpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Write access to the legacy ERP
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ErpGateway: Send + Sync {
    async fn insert_order(&self, order: &OrderPayload) -> Result<(), ErpError>;

    async fn insert_item(&self, item: &ItemPayload) -> Result<(), ErpError>;
}
