//! Serve command - runs the HTTP API

use std::io::Write;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::state::ApiSettings;
use crate::config::AppConfig;
use crate::infrastructure::seed::seed_master_key;

/// Run the API server
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    let services = crate::create_services(&config).await?;

    if let Some(plaintext) = seed_master_key(&*services.master_keys).await? {
        report_seeded_key(&plaintext, &mut std::io::stdout().lock())?;
    }

    let app = crate::create_app(services.into_state(ApiSettings::from(&config)));

    let addr = build_socket_addr(&config)?;
    info!("Starting ERP API Gateway on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// The plaintext goes to the terminal only, never into the log stream
fn report_seeded_key(plaintext: &str, out: &mut impl Write) -> std::io::Result<()> {
    warn!("No active master key found; created one and printed it to stdout");

    writeln!(out, "Initial master key created. Store it securely, it will not be shown again:")?;
    writeln!(out, "  {}", plaintext)?;
    out.flush()
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<IpAddr>()?,
        config.server.port,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
