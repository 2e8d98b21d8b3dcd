//! ERP gateway backed by stored procedures

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use crate::domain::erp::{ErpError, ErpGateway, ItemPayload, OrderPayload};

const ORDER_PROCEDURE: &str = "sp_inserepedidositemercado";
const ITEM_PROCEDURE: &str = "sp_insereitenssitemercado";

/// Calls the ERP procedures with positional parameters
#[derive(Debug, Clone)]
pub struct PostgresErpGateway {
    pool: PgPool,
    schema: String,
}

impl PostgresErpGateway {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    fn call_statement(&self, procedure: &str, params: usize) -> String {
        let placeholders = (1..=params)
            .map(|n| format!("${}", n))
            .collect::<Vec<_>>()
            .join(", ");

        format!("CALL {}.{}({})", self.schema, procedure, placeholders)
    }
}

#[async_trait]
impl ErpGateway for PostgresErpGateway {
    async fn insert_order(&self, order: &OrderPayload) -> Result<(), ErpError> {
        info!(
            nropedidoafv = %order.nropedidoafv,
            usuinclusao = %order.usuinclusao,
            "Inserting order in ERP"
        );

        let statement = self.call_statement(ORDER_PROCEDURE, 32);

        sqlx::query(&statement)
            .bind(&order.nropedidoafv)
            .bind(order.nroempresa)
            .bind(&order.nrocgccpf)
            .bind(&order.digcgccpf)
            .bind(&order.nomerazao)
            .bind(&order.fantasia)
            .bind(&order.fisicajuridica)
            .bind(&order.sexo)
            .bind(&order.cidade)
            .bind(&order.uf)
            .bind(&order.bairro)
            .bind(&order.logradouro)
            .bind(&order.nrologradouro)
            .bind(&order.cmpltologradouro)
            .bind(&order.cep)
            .bind(&order.foneddd1)
            .bind(&order.fonenro1)
            .bind(&order.foneddd2)
            .bind(&order.fonenro2)
            .bind(&order.inscricaorg)
            .bind(order.dtanascfund)
            .bind(&order.email)
            .bind(&order.emailnfe)
            .bind(&order.indentregaretira)
            .bind(order.dtapedidoafv)
            .bind(order.vlrtotfrete)
            .bind(order.valor)
            .bind(order.nroformapagto)
            .bind(&order.usuinclusao)
            .bind(order.nroparcelas)
            .bind(order.codoperadoracartao)
            .bind(&order.nrocartao)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(nropedidoafv = %order.nropedidoafv, error = %e, "ERP order insert failed");
                ErpError::new(e.to_string())
            })?;

        info!(nropedidoafv = %order.nropedidoafv, "Order inserted in ERP");
        Ok(())
    }

    async fn insert_item(&self, item: &ItemPayload) -> Result<(), ErpError> {
        info!(
            nropedidoafv = %item.nropedidoafv,
            seqpedvendaitem = item.seqpedvendaitem,
            codacesso = %item.codacesso,
            "Inserting item in ERP"
        );

        let statement = self.call_statement(ITEM_PROCEDURE, 8);

        sqlx::query(&statement)
            .bind(&item.nropedidoafv)
            .bind(item.seqpedvendaitem)
            .bind(&item.codacesso)
            .bind(item.seqproduto)
            .bind(item.qtdpedida)
            .bind(item.qtdembalagem)
            .bind(item.vlrembtabpreco)
            .bind(item.vlrembinformado)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    nropedidoafv = %item.nropedidoafv,
                    seqpedvendaitem = item.seqpedvendaitem,
                    error = %e,
                    "ERP item insert failed"
                );
                ErpError::new(e.to_string())
            })?;

        info!(
            nropedidoafv = %item.nropedidoafv,
            seqpedvendaitem = item.seqpedvendaitem,
            "Item inserted in ERP"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_call_statements() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/erp")
            .unwrap();
        let gateway = PostgresErpGateway::new(pool, "consinco");

        assert_eq!(
            gateway.call_statement(ITEM_PROCEDURE, 8),
            "CALL consinco.sp_insereitenssitemercado($1, $2, $3, $4, $5, $6, $7, $8)"
        );

        let order = gateway.call_statement(ORDER_PROCEDURE, 32);
        assert!(order.starts_with("CALL consinco.sp_inserepedidositemercado($1, "));
        assert!(order.ends_with("$32)"));
    }
}
