//! Request logging with sensitive field redaction
//!
//! `TraceLayer` already opens the request span, so this middleware only emits
//! one `"API request"` event per call.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use super::api_token::AuthenticatedToken;
use super::client_ip::client_ip;
use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Largest request body buffered for logging (10 MB)
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

pub const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "secret", "api_key", "authorization"];

pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let url = request.uri().to_string();
    let request_id = extract_request_id(&request);
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        state.settings.trust_forwarded_for,
    )
    .map(|ip| ip.to_string())
    .unwrap_or_else(|| "unknown".to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_response();
        }
    };
    let logged_body = serde_json::from_slice::<Value>(&bytes)
        .map(|mut value| {
            sanitize(&mut value);
            value.to_string()
        })
        .unwrap_or_default();

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let status = response.status().as_u16();
    let response_size = response.body().size_hint().exact().unwrap_or_default();
    let token = response.extensions().get::<AuthenticatedToken>();

    info!(
        request_id = %request_id,
        method = %method,
        url = %url,
        ip = %ip,
        user_agent = %user_agent,
        duration_ms = start.elapsed().as_millis() as u64,
        status,
        body = %logged_body,
        response_size,
        token_id = token.map(|t| t.id),
        token_name = token.map(|t| t.name.as_str()),
        "API request"
    );

    response
}

fn extract_request_id(request: &Request) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Replace the values of sensitive keys at any depth
pub fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if is_sensitive(key) {
                    *inner = Value::String(REDACTED.to_string());
                } else {
                    sanitize(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize),
        _ => {}
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k))
}
