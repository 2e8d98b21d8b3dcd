//! Recording ERP gateway

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::erp::{ErpError, ErpGateway, ItemPayload, OrderPayload};

/// Gateway that keeps every accepted payload in memory
///
/// Used when no ERP database is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryErpGateway {
    orders: Arc<RwLock<Vec<OrderPayload>>>,
    items: Arc<RwLock<Vec<ItemPayload>>>,
}

impl InMemoryErpGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders(&self) -> Vec<OrderPayload> {
        self.orders.read().await.clone()
    }

    pub async fn items(&self) -> Vec<ItemPayload> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl ErpGateway for InMemoryErpGateway {
    async fn insert_order(&self, order: &OrderPayload) -> Result<(), ErpError> {
        debug!(nropedidoafv = %order.nropedidoafv, "Recording order");
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn insert_item(&self, item: &ItemPayload) -> Result<(), ErpError> {
        debug!(
            nropedidoafv = %item.nropedidoafv,
            seqpedvendaitem = item.seqpedvendaitem,
            "Recording item"
        );
        self.items.write().await.push(item.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_items() {
        let gateway = InMemoryErpGateway::new();
        let item = ItemPayload {
            nropedidoafv: "PED1".to_string(),
            seqpedvendaitem: 1,
            codacesso: "789".to_string(),
            seqproduto: 10,
            qtdpedida: 2.0,
            qtdembalagem: 1.0,
            vlrembtabpreco: 9.9,
            vlrembinformado: 9.9,
        };

        gateway.insert_item(&item).await.unwrap();

        assert_eq!(gateway.items().await, vec![item]);
        assert!(gateway.orders().await.is_empty());
    }
}
