//! Site Mercado order intake, forwarded to the ERP

use axum::extract::State;
use serde::Serialize;
use tracing::{error, info};

use crate::api::middleware::CurrentApiToken;
use crate::api::state::AppState;
use crate::api::types::erp::{ItemRequest, OrderRequest};
use crate::api::types::{ApiError, ApiResponse, ValidatedJson};
use crate::domain::{ItemPayload, OrderPayload};

#[derive(Debug, Clone, Serialize)]
pub struct OrderInserted {
    pub nropedidoafv: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemInserted {
    pub nropedidoafv: String,
    pub seqpedvendaitem: i64,
}

/// POST /api/v1/site-mercado/pedidos
pub async fn insert_order(
    State(state): State<AppState>,
    CurrentApiToken(token): CurrentApiToken,
    ValidatedJson(request): ValidatedJson<OrderRequest>,
) -> Result<ApiResponse<OrderInserted>, ApiError> {
    let payload = OrderPayload::try_from(request)?;

    if let Err(e) = state.erp_gateway.insert_order(&payload).await {
        error!(
            nropedidoafv = %payload.nropedidoafv,
            token_id = token.id(),
            error = %e,
            "ERP rejected order"
        );
        return Err(ApiError::server_error(format!(
            "Error inserting order in ERP: {}",
            e.message()
        )));
    }

    info!(nropedidoafv = %payload.nropedidoafv, token_id = token.id(), "Order sent to ERP");

    Ok(ApiResponse::created(
        OrderInserted {
            nropedidoafv: payload.nropedidoafv,
        },
        "Order inserted successfully in ERP",
    ))
}

/// POST /api/v1/site-mercado/itens
pub async fn insert_item(
    State(state): State<AppState>,
    CurrentApiToken(token): CurrentApiToken,
    ValidatedJson(request): ValidatedJson<ItemRequest>,
) -> Result<ApiResponse<ItemInserted>, ApiError> {
    let payload = ItemPayload::try_from(request)?;

    if let Err(e) = state.erp_gateway.insert_item(&payload).await {
        error!(
            nropedidoafv = %payload.nropedidoafv,
            seqpedvendaitem = payload.seqpedvendaitem,
            token_id = token.id(),
            error = %e,
            "ERP rejected order item"
        );
        return Err(ApiError::server_error(format!(
            "Error inserting item in ERP: {}",
            e.message()
        )));
    }

    info!(
        nropedidoafv = %payload.nropedidoafv,
        seqpedvendaitem = payload.seqpedvendaitem,
        "Order item sent to ERP"
    );

    Ok(ApiResponse::created(
        ItemInserted {
            nropedidoafv: payload.nropedidoafv,
            seqpedvendaitem: payload.seqpedvendaitem,
        },
        "Item inserted successfully in ERP",
    ))
}
