//! Route table and middleware stack

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{
    request_logging_middleware, require_api_token, require_master_key,
    security_headers_middleware,
};
use super::state::AppState;
use super::types::ApiError;
use super::v1;

/// Create the full router with application state
///
/// Layers, outermost first: request id, trace span, security headers,
/// request logger. Each route group carries its own credential gate.
pub fn create_router_with_state(state: AppState) -> Router {
    let tokens = admin::create_admin_router()
        .route_layer(from_fn_with_state(state.clone(), require_master_key));

    let business = v1::create_v1_router()
        .route_layer(from_fn_with_state(state.clone(), require_api_token));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(tokens)
        .nest("/v1", business);

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), request_logging_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
