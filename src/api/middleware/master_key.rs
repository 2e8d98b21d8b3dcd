//! Master key gate for the token management routes

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::MasterKey;

pub const MASTER_KEY_HEADER: &str = "x-master-key";

/// Rejects requests without a valid `X-Master-Key`
///
/// On success the resolved [`MasterKey`] is placed in the request extensions.
pub async fn require_master_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(plaintext) = master_key_from_headers(request.headers()) else {
        debug!(path = %request.uri().path(), "Master key header missing");
        return Err(ApiError::unauthorized(
            "Master key not provided. Use the X-Master-Key header.",
        ));
    };

    let Some(key) = state.master_key_service.find_valid_key(&plaintext).await? else {
        warn!(path = %request.uri().path(), "Rejected invalid master key");
        return Err(ApiError::forbidden("Invalid, expired or inactive master key."));
    };

    state.master_key_service.touch(key.id()).await;
    request.extensions_mut().insert(key);

    Ok(next.run(request).await)
}

/// A header that is present but not visible ASCII still counts as a presented key
fn master_key_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(MASTER_KEY_HEADER)?;
    let value = String::from_utf8_lossy(value.as_bytes());
    let value = value.trim();

    (!value.is_empty()).then(|| value.to_string())
}

/// The master key that authorized the current request
#[derive(Debug, Clone)]
pub struct CurrentMasterKey(pub MasterKey);

impl<S: Send + Sync> FromRequestParts<S> for CurrentMasterKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<MasterKey>()
            .cloned()
            .map(CurrentMasterKey)
            .ok_or_else(|| {
                ApiError::unauthorized("Master key not provided. Use the X-Master-Key header.")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(MASTER_KEY_HEADER, "  mk_abc  ".parse().unwrap());
        assert_eq!(master_key_from_headers(&headers).as_deref(), Some("mk_abc"));
    }

    #[test]
    fn test_empty_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(MASTER_KEY_HEADER, "".parse().unwrap());
        assert!(master_key_from_headers(&headers).is_none());
        assert!(master_key_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_undecodable_header_is_presented() {
        let mut headers = HeaderMap::new();
        headers.insert(
            MASTER_KEY_HEADER,
            axum::http::HeaderValue::from_bytes(b"mk_\xffkey").unwrap(),
        );
        let presented = master_key_from_headers(&headers).unwrap();
        assert!(presented.starts_with("mk_"));
    }

    #[tokio::test]
    async fn test_current_master_key_requires_extension() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = CurrentMasterKey::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        parts.extensions.insert(MasterKey::new("Ops", "digest").with_id(3));
        let CurrentMasterKey(key) = CurrentMasterKey::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(key.id(), 3);
    }
}
