use anyhow::{Context, Result, anyhow};
use campus_common::database::{self, DatabaseConfig, init_pool, run_migrations};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod analytics;
mod chat;
mod error;
mod extract;
mod guard;
mod middleware;
mod models;
mod notifications;
mod repositories;
mod routes;
mod settings;
mod state;
mod validation;

use crate::{
    chat::ChatClient,
    middleware::{JwtConfig, JwtVerifier},
    settings::{ChatConfig, ServerConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    info!("Starting Campus Hub API");

    let server_config = ServerConfig::load().context("Failed to load server configuration")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    if server_config.run_migrations {
        run_migrations(&pool).await?;
    }

    let jwt_config = JwtConfig::from_env().map_err(|e| anyhow!(e))?;
    let jwt_verifier = JwtVerifier::new(&jwt_config).context("Invalid JWT configuration")?;

    let chat_config = ChatConfig::from_env();
    if chat_config.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; /api/chat will answer with 500");
    }
    let chat_client = ChatClient::new(chat_config).context("Failed to build chat client")?;

    let app_state = AppState::new(pool, jwt_verifier, chat_client);
    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Campus Hub API listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
