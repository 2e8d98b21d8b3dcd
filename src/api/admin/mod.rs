//! Management endpoints, gated by the master key

pub mod tokens;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Token management routes, relative to `/api`
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/tokens", get(tokens::list_tokens).post(tokens::create_token))
        .route(
            "/tokens/{id}",
            get(tokens::get_token)
                .put(tokens::update_token)
                .delete(tokens::delete_token),
        )
        .route("/tokens/{id}/revoke", post(tokens::revoke_token))
        .route("/tokens/{id}/activate", post(tokens::activate_token))
}
