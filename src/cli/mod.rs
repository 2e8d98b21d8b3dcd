//! CLI module for the ERP API Gateway
//!
//! Subcommands:
//! - `serve`: run the HTTP server
//! - `master-key create`: issue a master key
//! - `seed`: first-run credentials
//! - `migrate`: apply the credential schema

pub mod master_key;
pub mod migrate;
pub mod seed;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, BackendKind};
use crate::infrastructure::logging;

/// ERP API Gateway - credential management and ERP passthrough
#[derive(Parser)]
#[command(name = "erp-api-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Manage master keys
    #[command(subcommand)]
    MasterKey(master_key::MasterKeyCommand),

    /// Seed the initial master key and, optionally, demo tokens
    Seed(seed::SeedArgs),

    /// Run the credential schema migrations
    Migrate,
}

/// Load `.env`, configuration and logging for a command
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    config
}

/// Remind operators that in-memory credentials die with the process
pub(crate) fn warn_if_ephemeral(config: &AppConfig) {
    if config.storage.backend == BackendKind::InMemory {
        tracing::warn!(
            "storage.backend is in_memory; credentials created by this command are not persisted"
        );
    }
}
