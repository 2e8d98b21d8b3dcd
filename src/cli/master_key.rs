//! `master-key` commands

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::json;

use crate::domain::validation::parse_datetime;
use crate::domain::MasterKey;

#[derive(Subcommand)]
pub enum MasterKeyCommand {
    /// Create a new master key and print it once
    Create(CreateMasterKeyArgs),
}

#[derive(Args, Clone)]
pub struct CreateMasterKeyArgs {
    /// Descriptive name for the key
    pub name: String,

    /// Expiration (YYYY-MM-DD HH:MM:SS in UTC, RFC 3339, or YYYY-MM-DD)
    #[arg(long)]
    pub expires: Option<String>,

    /// Who is creating the key
    #[arg(long, default_value = "CLI Command")]
    pub created_by: String,
}

pub async fn run(command: MasterKeyCommand) -> anyhow::Result<()> {
    match command {
        MasterKeyCommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateMasterKeyArgs) -> anyhow::Result<()> {
    let expires_at = parse_expiration(args.expires.as_deref())?;

    let config = super::bootstrap();
    super::warn_if_ephemeral(&config);
    let services = crate::create_services(&config).await?;

    let metadata = json!({
        "created_via": "cli_command",
        "created_at_timestamp": Utc::now().timestamp(),
    });

    let created = services
        .master_keys
        .create(&args.name, expires_at, &args.created_by, Some(metadata))
        .await?;

    println!("{}", render_created(&created.key, &created.plaintext));

    Ok(())
}

fn parse_expiration(raw: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let at = parse_datetime(raw).ok_or_else(|| {
        anyhow::anyhow!("Invalid date format. Use: YYYY-MM-DD HH:MM:SS")
    })?;

    if at <= Utc::now() {
        anyhow::bail!("Expiration date must be in the future");
    }

    Ok(Some(at))
}

fn render_created(key: &MasterKey, plaintext: &str) -> String {
    let expires = key
        .expires_at()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string());
    let status = if key.is_active() { "Active" } else { "Inactive" };

    [
        "Master key created successfully".to_string(),
        String::new(),
        format!("  ID:         {}", key.id()),
        format!("  Name:       {}", key.name()),
        format!("  Created by: {}", key.created_by().unwrap_or("-")),
        format!("  Status:     {}", status),
        format!("  Expires:    {}", expires),
        String::new(),
        format!("  Key: {}", plaintext),
        String::new(),
        "IMPORTANT: store this key securely. It will not be shown again.".to_string(),
        String::new(),
        "Usage:".to_string(),
        "  Send the key in the X-Master-Key header to manage API tokens:".to_string(),
        format!(
            "  curl -H \"X-Master-Key: {}\" http://localhost:8080/api/tokens",
            plaintext
        ),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_expiration_formats() {
        assert!(parse_expiration(None).unwrap().is_none());

        let at = parse_expiration(Some("2099-12-31 23:59:59")).unwrap().unwrap();
        assert_eq!(at.format("%Y-%m-%d %H:%M:%S").to_string(), "2099-12-31 23:59:59");

        assert!(parse_expiration(Some("2099-12-31")).unwrap().is_some());
        assert!(parse_expiration(Some("2099-12-31T10:00:00+02:00")).unwrap().is_some());
    }

    #[test]
    fn test_parse_expiration_rejects_bad_input() {
        let err = parse_expiration(Some("31/12/2099")).unwrap_err();
        assert!(err.to_string().contains("Invalid date format"));

        let past = (Utc::now() - Duration::days(1)).format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(parse_expiration(Some(&past)).is_err());
    }

    #[test]
    fn test_render_created() {
        let key = MasterKey::new("Ops", "digest")
            .with_id(7)
            .with_created_by("CLI Command");
        let output = render_created(&key, "mk_plain");

        assert!(output.contains("ID:         7"));
        assert!(output.contains("Expires:    Never"));
        assert!(output.contains("Status:     Active"));
        assert!(output.contains("Key: mk_plain"));
    }
}
