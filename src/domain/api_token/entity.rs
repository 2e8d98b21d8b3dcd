//! API token entity, change sets and public views

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Wildcard ability granting access to everything
pub const WILDCARD_ABILITY: &str = "*";

/// Requests per minute applied when a token does not set its own limit
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// API token record
///
/// Holds the SHA-256 digest of the bearer value, never the value itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiToken {
    id: i64,
    name: String,
    token_digest: String,
    /// Granted abilities (None or empty = unrestricted)
    abilities: Option<Vec<String>>,
    last_used_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    /// Single IPv4/IPv6 address the token is bound to
    ip_restriction: Option<String>,
    /// Requests per minute
    rate_limit: u32,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApiToken {
    pub fn new(name: impl Into<String>, token_digest: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            name: name.into(),
            token_digest: token_digest.into(),
            abilities: None,
            last_used_at: None,
            expires_at: None,
            is_active: true,
            ip_restriction: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_abilities(mut self, abilities: Option<Vec<String>>) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_ip_restriction(mut self, ip_restriction: Option<String>) -> Self {
        self.ip_restriction = ip_restriction;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_last_used_at(mut self, last_used_at: Option<DateTime<Utc>>) -> Self {
        self.last_used_at = last_used_at;
        self
    }

    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token_digest(&self) -> &str {
        &self.token_digest
    }

    pub fn abilities(&self) -> Option<&[String]> {
        self.abilities.as_deref()
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn ip_restriction(&self) -> Option<&str> {
        self.ip_restriction.as_deref()
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Status checks

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Active and not expired
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether the token grants `ability`
    pub fn has_ability(&self, ability: &str) -> bool {
        match self.abilities.as_deref() {
            None | Some([]) => true,
            Some(granted) => granted
                .iter()
                .any(|g| g == WILDCARD_ABILITY || g == ability),
        }
    }

    /// Whether a request from `ip` passes the IP restriction
    ///
    /// An unknown client address never matches a restricted token.
    pub fn allows_ip(&self, ip: Option<IpAddr>) -> bool {
        let restriction = match self.ip_restriction.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(restriction) => restriction,
        };

        let Some(ip) = ip else {
            return false;
        };

        match restriction.parse::<IpAddr>() {
            Ok(allowed) => allowed == ip,
            Err(_) => restriction == ip.to_string(),
        }
    }

    // Mutators

    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        self.touch();
    }

    /// Apply a partial update
    pub fn apply(&mut self, changes: ApiTokenChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(abilities) = changes.abilities {
            self.abilities = Some(abilities);
        }
        if let Some(expires_at) = changes.expires_at {
            self.expires_at = expires_at;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(ip_restriction) = changes.ip_restriction {
            self.ip_restriction = ip_restriction;
        }
        if let Some(rate_limit) = changes.rate_limit {
            self.rate_limit = rate_limit;
        }
        if let Some(metadata) = changes.metadata {
            self.metadata = metadata;
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Fields for a token that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewApiToken {
    pub name: String,
    pub abilities: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip_restriction: Option<String>,
    pub rate_limit: u32,
    pub metadata: Option<Value>,
}

impl NewApiToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abilities: vec![WILDCARD_ABILITY.to_string()],
            expires_at: None,
            ip_restriction: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            metadata: None,
        }
    }

    pub fn with_abilities(mut self, abilities: Vec<String>) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_ip_restriction(mut self, ip_restriction: Option<String>) -> Self {
        self.ip_restriction = ip_restriction;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build the entity that will be stored under `token_digest`
    pub fn into_token(self, token_digest: impl Into<String>) -> ApiToken {
        ApiToken::new(self.name, token_digest)
            .with_abilities(Some(self.abilities))
            .with_expiration(self.expires_at)
            .with_ip_restriction(self.ip_restriction)
            .with_rate_limit(self.rate_limit)
            .with_metadata(self.metadata)
    }
}

/// Partial update of a token
///
/// For the nullable columns the outer `Option` says whether the field was sent,
/// the inner one carries the new value (`Some(None)` clears it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiTokenChanges {
    pub name: Option<String>,
    pub abilities: Option<Vec<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
    pub ip_restriction: Option<Option<String>>,
    pub rate_limit: Option<u32>,
    pub metadata: Option<Option<Value>>,
}

impl ApiTokenChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Full public representation of a token (no digest)
#[derive(Debug, Clone, Serialize)]
pub struct ApiTokenView {
    pub id: i64,
    pub name: String,
    pub abilities: Option<Vec<String>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub ip_restriction: Option<String>,
    pub rate_limit: u32,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApiToken> for ApiTokenView {
    fn from(token: &ApiToken) -> Self {
        Self {
            id: token.id,
            name: token.name.clone(),
            abilities: token.abilities.clone(),
            last_used_at: token.last_used_at,
            expires_at: token.expires_at,
            is_active: token.is_active,
            ip_restriction: token.ip_restriction.clone(),
            rate_limit: token.rate_limit,
            metadata: token.metadata.clone(),
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

/// Listing representation of a token
#[derive(Debug, Clone, Serialize)]
pub struct ApiTokenSummary {
    pub id: i64,
    pub name: String,
    pub abilities: Option<Vec<String>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiToken> for ApiTokenSummary {
    fn from(token: &ApiToken) -> Self {
        Self {
            id: token.id,
            name: token.name.clone(),
            abilities: token.abilities.clone(),
            last_used_at: token.last_used_at,
            expires_at: token.expires_at,
            is_active: token.is_active,
            created_at: token.created_at,
        }
    }
}
