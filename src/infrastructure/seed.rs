//! First-run seeding of credentials

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;

use crate::domain::api_token::{ApiTokenRepository, NewApiToken, WILDCARD_ABILITY};
use crate::domain::master_key::MasterKeyRepository;
use crate::domain::DomainError;
use crate::infrastructure::api_token::ApiTokenService;
use crate::infrastructure::credentials::CredentialGenerator;
use crate::infrastructure::master_key::MasterKeyService;

pub const INITIAL_MASTER_KEY_NAME: &str = "Initial Master Key";
pub const SEEDER_CREATOR: &str = "System (Seeder)";

/// Plaintexts of seeded demo tokens, for printing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededToken {
    pub name: String,
    pub plaintext: String,
}

/// Create the initial master key unless an active one already exists
///
/// Returns the plaintext of the new key.
pub async fn seed_master_key<R>(service: &MasterKeyService<R>) -> Result<Option<String>, DomainError>
where
    R: MasterKeyRepository + ?Sized,
{
    if service.has_active_key().await? {
        info!("An active master key already exists, no new key was created");
        return Ok(None);
    }

    let metadata = json!({
        "created_via": "seeder",
        "created_at_timestamp": Utc::now().timestamp(),
        "description": "Master key created automatically during initial system setup",
    });

    let created = service
        .create(INITIAL_MASTER_KEY_NAME, None, SEEDER_CREATOR, Some(metadata))
        .await?;

    Ok(Some(created.plaintext))
}

/// Create the demo tokens used in development
pub async fn seed_api_tokens<R>(
    service: &ApiTokenService<R>,
    generator: &CredentialGenerator,
) -> Result<Vec<SeededToken>, DomainError>
where
    R: ApiTokenRepository + ?Sized,
{
    let metadata = |environment: &str| json!({"environment": environment, "created_by": "seeder"});
    let fixture = |note: &str| {
        json!({"environment": "testing", "created_by": "seeder", "note": note})
    };
    let wildcard = || vec![WILDCARD_ABILITY.to_string()];

    let tokens = vec![
        (
            NewApiToken::new("Development Token")
                .with_abilities(wildcard())
                .with_rate_limit(1000)
                .with_metadata(Some(metadata("development"))),
            format!("dev-token-{}", generator.random_hex(20)),
            true,
        ),
        (
            NewApiToken::new("Test Token (Read Only)")
                .with_abilities(vec!["read".to_string()])
                .with_rate_limit(100)
                .with_expiration(Some(Utc::now() + Duration::days(90)))
                .with_metadata(Some(metadata("testing"))),
            format!("test-token-{}", generator.random_hex(20)),
            true,
        ),
        (
            NewApiToken::new("IP Restricted Token")
                .with_abilities(wildcard())
                .with_ip_restriction(Some("127.0.0.1".to_string()))
                .with_rate_limit(60)
                .with_metadata(Some(metadata("production"))),
            format!("restricted-token-{}", generator.random_hex(20)),
            true,
        ),
        (
            NewApiToken::new("Expired Token")
                .with_abilities(wildcard())
                .with_expiration(Some(Utc::now() - Duration::days(1)))
                .with_metadata(Some(fixture("Expired on purpose for testing"))),
            "expired-token".to_string(),
            true,
        ),
        (
            NewApiToken::new("Inactive Token")
                .with_abilities(wildcard())
                .with_metadata(Some(fixture("Inactive on purpose for testing"))),
            "inactive-token".to_string(),
            false,
        ),
    ];

    let mut seeded = Vec::with_capacity(tokens.len());

    for (draft, plaintext, active) in tokens {
        let created = service.create_with_plaintext(draft, &plaintext).await?;

        if !active {
            service.revoke(created.token.id()).await?;
        }

        seeded.push(SeededToken {
            name: created.token.name().to_string(),
            plaintext: created.plaintext,
        });
    }

    info!(count = seeded.len(), "Seeded API tokens");

    Ok(seeded)
}
