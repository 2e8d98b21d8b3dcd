//! `seed` command

use clap::Args;
use tracing::info;

use crate::infrastructure::credentials::CredentialGenerator;
use crate::infrastructure::seed::{seed_api_tokens, seed_master_key};

#[derive(Args, Clone, Debug)]
pub struct SeedArgs {
    /// Also create the development and test tokens
    #[arg(long)]
    pub with_tokens: bool,
}

pub async fn run(args: SeedArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    super::warn_if_ephemeral(&config);
    let services = crate::create_services(&config).await?;

    match seed_master_key(&*services.master_keys).await? {
        Some(plaintext) => {
            println!("Initial master key created. Store it securely, it will not be shown again:");
            println!("  {}", plaintext);
        }
        None => println!("An active master key already exists. Nothing to do."),
    }

    if args.with_tokens {
        let generator = CredentialGenerator::default();
        let tokens = seed_api_tokens(&*services.api_tokens, &generator).await?;

        println!();
        println!("Seeded API tokens:");
        for token in &tokens {
            println!("  {:<24} {}", token.name, token.plaintext);
        }
        info!(count = tokens.len(), "Demo tokens seeded");
    }

    Ok(())
}
