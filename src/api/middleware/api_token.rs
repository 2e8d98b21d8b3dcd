//! Bearer token gate for the versioned business routes

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::client_ip::client_ip;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{ApiToken, AuthError};

/// Identity of the token that served a request, left on the response for the logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedToken {
    pub id: i64,
    pub name: String,
}

/// Authenticates `Authorization: Bearer`, enforces IP and rate limits
pub async fn require_api_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = bearer_token(request.headers());
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        state.settings.trust_forwarded_for,
    );

    let token = state
        .api_token_service
        .authenticate(bearer.as_deref(), ip)
        .await?;

    let quota = if state.settings.rate_limiting_enabled {
        let result = state.api_token_service.check_rate_limit(&token).await;

        if !result.allowed {
            warn!(token_id = token.id(), limit = result.limit, "Token rate limit exceeded");
            return Err(AuthError::RateLimited {
                limit: result.limit,
                retry_after_secs: result.reset_in_seconds,
            }
            .into());
        }

        Some((result.limit, result.remaining))
    } else {
        None
    };

    let marker = AuthenticatedToken {
        id: token.id(),
        name: token.name().to_string(),
    };
    request.extensions_mut().insert(token);

    let mut response = next.run(request).await;

    if let Some((limit, remaining)) = quota {
        let headers = response.headers_mut();
        headers.insert(
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(limit),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(remaining),
        );
    }
    response.extensions_mut().insert(marker);

    Ok(response)
}

/// Value after `Bearer ` in the Authorization header
///
/// Bytes outside visible ASCII are kept (lossily) so such a token is rejected
/// as invalid rather than reported as missing.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let value = String::from_utf8_lossy(value.as_bytes());
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The API token that authorized the current request
#[derive(Debug, Clone)]
pub struct CurrentApiToken(pub ApiToken);

impl<S: Send + Sync> FromRequestParts<S> for CurrentApiToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiToken>()
            .cloned()
            .map(CurrentApiToken)
            .ok_or_else(|| AuthError::MissingCredential.into())
    }
}
