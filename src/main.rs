use clap::Parser;
use erp_api_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::MasterKey(command) => cli::master_key::run(command).await,
        Command::Seed(args) => cli::seed::run(args).await,
        Command::Migrate => cli::migrate::run().await,
    }
}
