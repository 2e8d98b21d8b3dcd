//! HTTP error type rendered as a failed envelope

use std::collections::BTreeMap;

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::domain::{AuthError, DomainError};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

/// Field name to list of messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<Value>,
    pub headers: HeaderMap,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 422 with a generic message and no field details
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// 422 carrying the per-field messages
    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self::unprocessable(message).with_data(json!(errors))
    }

    /// 422 from `validator` errors
    pub fn from_validation_errors(message: impl Into<String>, errors: &ValidationErrors) -> Self {
        Self::validation(message, field_errors(errors))
    }

    /// 429 with the rate limit headers
    pub fn rate_limited(limit: u32, retry_after_secs: u64) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "Too many requests")
            .with_header(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(limit),
            )
            .with_header(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_static("0"),
            )
            .with_header(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs),
            )
    }

    /// 500 with a caller-visible message
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 500 with the generic message
    pub fn internal() -> Self {
        Self::server_error(INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.message,
            "data": self.data,
        });

        (self.status, self.headers, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::unprocessable(message),
            other => {
                error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}

/// Bearer stage rejections
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => Self::unauthorized("Authentication token not provided"),
            AuthError::InvalidOrExpired => Self::unauthorized("Invalid or expired token"),
            AuthError::IpForbidden => Self::forbidden("Access denied for this IP"),
            AuthError::RateLimited {
                limit,
                retry_after_secs,
            } => Self::rate_limited(limit, retry_after_secs),
            AuthError::Unexpected(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Flatten `validator` errors into `{field: [messages]}`
///
/// Nested structs and lists are reported with dotted paths.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path.clone()).or_default();
                messages.extend(list.iter().map(|e| describe(&path, e)));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

/// Human readable message for one failed rule
fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(format_param);
    let label = field.replace('_', " ");

    match &*error.code {
        "required" => format!("The {} field is required.", label),
        "email" => format!("The {} field must be a valid email address.", label),
        "length" => match (param("equal"), param("min"), param("max")) {
            (Some(equal), _, _) => format!("The {} field must be {} characters.", label, equal),
            (None, _, Some(max)) => {
                format!("The {} field must not be greater than {} characters.", label, max)
            }
            (None, Some(min), None) => {
                format!("The {} field must be at least {} characters.", label, min)
            }
            _ => format!("The {} field has an invalid length.", label),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("The {} field must be between {} and {}.", label, min, max)
            }
            (Some(min), None) => format!("The {} field must be at least {}.", label, min),
            (None, Some(max)) => {
                format!("The {} field must not be greater than {}.", label, max)
            }
            _ => format!("The {} field is out of range.", label),
        },
        _ => format!("The {} field is invalid.", label),
    }
}

fn format_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(required)]
        name: Option<String>,
        #[validate(length(max = 3))]
        code: Option<String>,
        #[validate(range(min = 1, max = 1000))]
        rate_limit: Option<i64>,
        #[validate(email(message = "Bad email"))]
        email: Option<String>,
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_field_errors_messages() {
        let sample = Sample {
            name: None,
            code: Some("ABCD".to_string()),
            rate_limit: Some(0),
            email: Some("nope".to_string()),
        };
        let errors = field_errors(&sample.validate().unwrap_err());

        assert_eq!(errors["name"], vec!["The name field is required."]);
        assert_eq!(
            errors["code"],
            vec!["The code field must not be greater than 3 characters."]
        );
        assert_eq!(
            errors["rate_limit"],
            vec!["The rate limit field must be between 1 and 1000."]
        );
        assert_eq!(errors["email"], vec!["Bad email"]);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::not_found("Token not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Token not found");
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_storage_errors_are_hidden() {
        let err: ApiError = DomainError::storage("password=hunter2 host=db").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(err.into_response()).await;
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!json.to_string().contains("hunter2"));
    }

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::MissingCredential, StatusCode::UNAUTHORIZED, "Authentication token not provided"),
            (AuthError::InvalidOrExpired, StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            (AuthError::IpForbidden, StatusCode::FORBIDDEN, "Access denied for this IP"),
        ];

        for (auth_error, status, message) in cases {
            let err: ApiError = auth_error.into();
            assert_eq!(err.status, status);
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_rate_limited_headers() {
        let response = ApiError::from(AuthError::RateLimited {
            limit: 60,
            retry_after_secs: 12,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-limit"], "60");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(response.headers()["retry-after"], "12");
    }
}
