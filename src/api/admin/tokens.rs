//! API token management endpoints (master key protected)

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::middleware::CurrentMasterKey;
use crate::api::state::AppState;
use crate::api::types::json::{parse_validated, ValidatedJson, ValidatedRequest};
use crate::api::types::{ApiError, ApiResponse, Paginated};
use crate::domain::validation::{
    parse_datetime, rule_error, validate_boolean, validate_future_datetime, validate_integer,
    validate_ip_address, validate_metadata, validate_string, validate_string_array,
};
use crate::domain::{ApiTokenChanges, ApiTokenSummary, ApiTokenView, NewApiToken, PageRequest};

pub const TOKENS_PATH: &str = "/api/tokens";

const TOKEN_NOT_FOUND: &str = "Token not found";
const MAX_NAME_LENGTH: usize = 255;

type FieldRule = fn(&Value) -> Result<(), ValidationError>;

fn validate_name(value: &Value) -> Result<(), ValidationError> {
    validate_string(value)
        .map_err(|_| rule_error("string", "The name field must be a string."))?;

    let name = value.as_str().unwrap_or_default();
    if name.trim().is_empty() {
        return Err(rule_error("required", "The name field is required."));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(rule_error(
            "length",
            "The name field must not be greater than 255 characters.",
        ));
    }
    Ok(())
}

fn validate_abilities(value: &Value) -> Result<(), ValidationError> {
    validate_string_array(value)
        .map_err(|_| rule_error("array", "The abilities field must be an array of strings."))
}

fn validate_expires_at(value: &Value) -> Result<(), ValidationError> {
    match value.as_str() {
        Some(raw) => validate_future_datetime(raw),
        None => Err(rule_error("date", "The expiration date must be a valid date")),
    }
}

fn validate_ip_restriction(value: &Value) -> Result<(), ValidationError> {
    match value.as_str() {
        Some(raw) => validate_ip_address(raw),
        None => Err(rule_error("ip", "The IP restriction must be a valid IP address")),
    }
}

fn validate_is_active(value: &Value) -> Result<(), ValidationError> {
    validate_boolean(value)
        .map_err(|_| rule_error("boolean", "The is active field must be true or false."))
}

fn validate_rate_limit(value: &Value) -> Result<(), ValidationError> {
    validate_integer(value)
        .map_err(|_| rule_error("integer", "The rate limit field must be an integer."))?;

    match value.as_i64() {
        Some(rate_limit) if (1..=1000).contains(&rate_limit) => Ok(()),
        _ => Err(rule_error("range", "The rate limit field must be between 1 and 1000.")),
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)` instead of folding it into absence
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn string_of(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(|s| s.trim().to_string())
}

fn abilities_of(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn rate_limit_of(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_i64)
        .and_then(|r| u32::try_from(r).ok())
}

/// `Some(None)` for an explicit null
fn nullable<T>(value: Option<&Value>, read: impl FnOnce(&Value) -> Option<T>) -> Option<Option<T>> {
    value.map(|v| if v.is_null() { None } else { read(v) })
}

/// Path IDs that are not numbers cannot name a token
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(TOKEN_NOT_FOUND))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTokensQuery {
    pub page: Option<String>,
}

impl ListTokensQuery {
    /// Missing, non-numeric or < 1 means the first page
    pub fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Fields are read as raw JSON so that a wrong type is reported per field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTokenRequest {
    #[validate(required, custom(function = "validate_name"))]
    pub name: Option<Value>,
    #[validate(custom(function = "validate_abilities"))]
    pub abilities: Option<Value>,
    #[validate(custom(function = "validate_expires_at"))]
    pub expires_at: Option<Value>,
    #[validate(custom(function = "validate_ip_restriction"))]
    pub ip_restriction: Option<Value>,
    #[validate(custom(function = "validate_rate_limit"))]
    pub rate_limit: Option<Value>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<Value>,
}

impl ValidatedRequest for CreateTokenRequest {}

impl CreateTokenRequest {
    fn into_draft(self, default_rate_limit: u32) -> NewApiToken {
        let mut draft = NewApiToken::new(string_of(self.name.as_ref()).unwrap_or_default())
            .with_expiration(
                self.expires_at
                    .as_ref()
                    .and_then(Value::as_str)
                    .and_then(parse_datetime),
            )
            .with_ip_restriction(string_of(self.ip_restriction.as_ref()))
            .with_rate_limit(rate_limit_of(self.rate_limit.as_ref()).unwrap_or(default_rate_limit))
            .with_metadata(self.metadata);

        if let Some(abilities) = abilities_of(self.abilities.as_ref()) {
            draft = draft.with_abilities(abilities);
        }

        draft
    }
}

/// Partial update; an absent field is `None`, an explicit null is `Some(Value::Null)`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTokenRequest {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub abilities: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub expires_at: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub is_active: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub ip_restriction: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub rate_limit: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub metadata: Option<Value>,
}

impl Validate for UpdateTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        // (field, value, rule, accepts null)
        let rules: [(&'static str, Option<&Value>, FieldRule, bool); 7] = [
            ("name", self.name.as_ref(), validate_name, false),
            ("abilities", self.abilities.as_ref(), validate_abilities, false),
            ("expires_at", self.expires_at.as_ref(), validate_expires_at, true),
            ("is_active", self.is_active.as_ref(), validate_is_active, false),
            ("ip_restriction", self.ip_restriction.as_ref(), validate_ip_restriction, true),
            ("rate_limit", self.rate_limit.as_ref(), validate_rate_limit, false),
            ("metadata", self.metadata.as_ref(), validate_metadata, true),
        ];

        for (field, value, rule, nullable) in rules {
            let Some(value) = value else { continue };
            if nullable && value.is_null() {
                continue;
            }
            if let Err(e) = rule(value) {
                errors.add(field, e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ValidatedRequest for UpdateTokenRequest {}

impl From<UpdateTokenRequest> for ApiTokenChanges {
    fn from(request: UpdateTokenRequest) -> Self {
        Self {
            name: string_of(request.name.as_ref()),
            abilities: abilities_of(request.abilities.as_ref()),
            expires_at: nullable(request.expires_at.as_ref(), |v| {
                v.as_str().and_then(parse_datetime)
            }),
            is_active: request.is_active.as_ref().and_then(Value::as_bool),
            ip_restriction: nullable(request.ip_restriction.as_ref(), |v| {
                v.as_str().map(|ip| ip.trim().to_string())
            }),
            rate_limit: rate_limit_of(request.rate_limit.as_ref()),
            metadata: nullable(request.metadata.as_ref(), |v| Some(v.clone())),
        }
    }
}

/// Shown once, at creation
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTokenResponse {
    pub token: String,
    pub token_info: TokenInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub id: i64,
    pub name: String,
    pub abilities: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// GET /api/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<ListTokensQuery>,
) -> Result<ApiResponse<Paginated<ApiTokenSummary>>, ApiError> {
    let request = PageRequest::new(query.page(), state.settings.page_size);
    let page = state.api_token_service.list(request).await?;
    let page = page.map(|token| ApiTokenSummary::from(&token));

    Ok(ApiResponse::ok(
        Paginated::from_page(page, TOKENS_PATH),
        "Tokens retrieved successfully",
    ))
}

/// POST /api/tokens
pub async fn create_token(
    State(state): State<AppState>,
    CurrentMasterKey(master_key): CurrentMasterKey,
    ValidatedJson(request): ValidatedJson<CreateTokenRequest>,
) -> Result<ApiResponse<CreatedTokenResponse>, ApiError> {
    let draft = request.into_draft(state.settings.default_rate_limit);
    let created = state.api_token_service.create(draft).await?;

    info!(
        token_id = created.token.id(),
        master_key_id = master_key.id(),
        "API token issued"
    );

    let token = created.token;
    Ok(ApiResponse::created(
        CreatedTokenResponse {
            token: created.plaintext,
            token_info: TokenInfo {
                id: token.id(),
                name: token.name().to_string(),
                abilities: token.abilities().map(<[String]>::to_vec),
                expires_at: token.expires_at(),
                created_at: token.created_at(),
            },
        },
        "Token created successfully. Store it securely, it will not be shown again.",
    ))
}

/// GET /api/tokens/{id}
pub async fn get_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ApiTokenView>, ApiError> {
    let token = state.api_token_service.get(parse_id(&id)?).await?;

    Ok(ApiResponse::ok(
        ApiTokenView::from(&token),
        "Token retrieved successfully",
    ))
}

/// PUT /api/tokens/{id}
///
/// The token is resolved before the body is read, so an unknown ID is a 404
/// even when the body is invalid.
pub async fn update_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<ApiTokenView>, ApiError> {
    let id = parse_id(&id)?;
    state.api_token_service.get(id).await?;

    let request = parse_validated::<UpdateTokenRequest>(&body)?;
    let token = state.api_token_service.update(id, request.into()).await?;

    Ok(ApiResponse::ok(
        ApiTokenView::from(&token),
        "Token updated successfully",
    ))
}

/// DELETE /api/tokens/{id}
pub async fn delete_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.api_token_service.delete(parse_id(&id)?).await?;
    Ok(ApiResponse::empty("Token deleted successfully"))
}

/// POST /api/tokens/{id}/revoke
pub async fn revoke_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.api_token_service.revoke(parse_id(&id)?).await?;
    Ok(ApiResponse::empty("Token revoked successfully"))
}

/// POST /api/tokens/{id}/activate
pub async fn activate_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.api_token_service.activate(parse_id(&id)?).await?;
    Ok(ApiResponse::empty("Token activated successfully"))
}
