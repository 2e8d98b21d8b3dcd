//! Versioned business endpoints (bearer token protected)

pub mod site_mercado;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/site-mercado/pedidos", post(site_mercado::insert_order))
        .route("/site-mercado/itens", post(site_mercado::insert_item))
}
