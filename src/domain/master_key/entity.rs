//! Master key entity and its public view

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Master key record
///
/// Only the SHA-256 digest of the key is held; the entity is intentionally not
/// `Serialize`. Use [`MasterKeyView`] for anything leaving the process.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterKey {
    /// Store-assigned identifier (0 until persisted)
    id: i64,
    /// Display name
    name: String,
    /// Hex SHA-256 digest of the plaintext key
    key_digest: String,
    is_active: bool,
    /// Expiration timestamp (None = never expires)
    expires_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
    /// Who created the key (CLI user, seeder, ...)
    created_by: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MasterKey {
    /// Create a new, active master key from an already computed digest
    pub fn new(name: impl Into<String>, key_digest: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            name: name.into(),
            key_digest: key_digest.into(),
            is_active: true,
            expires_at: None,
            last_used_at: None,
            created_by: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
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

    pub fn key_digest(&self) -> &str {
        &self.key_digest
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
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

    /// Active and not past its expiration at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }

        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    // Mutators

    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Public representation of a master key (never includes the digest)
#[derive(Debug, Clone, Serialize)]
pub struct MasterKeyView {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&MasterKey> for MasterKeyView {
    fn from(key: &MasterKey) -> Self {
        Self {
            id: key.id,
            name: key.name.clone(),
            is_active: key.is_active,
            expires_at: key.expires_at,
            last_used_at: key.last_used_at,
            created_by: key.created_by.clone(),
            metadata: key.metadata.clone(),
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}
