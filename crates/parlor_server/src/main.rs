//! Parlor session server binary.

use anyhow::Result;
use clap::Parser;
use parlor_server::{Config, Registry};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    let registry = Registry::new(config.spectator_policy());
    let app = parlor_server::router(registry);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(bind = %config.bind, "Parlor session server ready");
    info!("Clients connect to ws://{}/ws", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
