//! JSON extractors that reject with the failed envelope

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::{ApiError, VALIDATION_FAILED_MESSAGE};

/// JSON extractor whose rejections are 422 envelopes
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::unprocessable(format_rejection_message(&rejection))),
        }
    }
}

/// Request bodies that carry their own validation failure message
pub trait ValidatedRequest: Validate {
    const FAILURE_MESSAGE: &'static str = VALIDATION_FAILED_MESSAGE;
}

/// Deserializes then validates; failures become 422 with field errors
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + ValidatedRequest,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        validate(value).map(ValidatedJson)
    }
}

/// Run the validation rules of a request already parsed
pub fn validate<T: ValidatedRequest>(value: T) -> Result<T, ApiError> {
    match value.validate() {
        Ok(()) => Ok(value),
        Err(errors) => Err(ApiError::from_validation_errors(T::FAILURE_MESSAGE, &errors)),
    }
}

/// Parse and validate a raw body
///
/// Used by handlers that must resolve the target resource before looking at the body.
pub fn parse_validated<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + ValidatedRequest,
{
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    let value = serde_json::from_slice::<T>(body)
        .map_err(|e| ApiError::unprocessable(format!("Invalid JSON data: {}", e)))?;

    validate(value)
}

fn format_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        JsonRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    }
}
