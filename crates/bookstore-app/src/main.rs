use std::sync::Arc;

use bookstore_hex::application::Services;
use bookstore_hex::config::Config;
use bookstore_hex::identity::StaticTokenIdentity;
use bookstore_hex::inbound::http::{HttpServer, HttpServerConfig};
use bookstore_repo::{build_repo, Repo};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / AUTH_TOKENS when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(
        backend = repo.backend(),
        env = ?config.app_env,
        store_timeout_ms = %config.store_timeout.as_millis(),
        "storage ready"
    );

    let identity = StaticTokenIdentity::from_config(&config);
    tracing::info!(tokens = identity.len(), "identity provider loaded");

    let services = Services::new(repo, &config);
    let http = HttpServer::new(
        services,
        Arc::new(identity),
        HttpServerConfig::from(&config),
    )
    .await?;
    http.run().await
}
