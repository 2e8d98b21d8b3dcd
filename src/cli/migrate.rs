//! `migrate` command

use tracing::info;

use crate::config::BackendKind;
use crate::infrastructure::storage::{run_credential_migrations, PostgresMigrator};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    if config.storage.backend != BackendKind::Postgres {
        anyhow::bail!("Migrations require storage.backend = \"postgres\"");
    }

    let pool = crate::connect_credential_store(&config).await?;
    let applied = run_credential_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool).current_version().await?;

    info!(applied, ?version, "Credential migrations finished");
    println!(
        "Applied {} migration(s), schema version {}",
        applied,
        version.map_or_else(|| "none".to_string(), |v| v.to_string())
    );

    Ok(())
}
