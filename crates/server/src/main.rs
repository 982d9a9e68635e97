use std::sync::Arc;

use agent_client::RuntimeClient;
use anyhow::Error as AnyhowError;
use db::DBService;
use server::{AppState, routes, sync};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Error)]
pub enum AssistantServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), AssistantServerError> {
    // Load environment variables from `.env` if present so local development
    // picks up runtime endpoints and dev-mode identity.
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},db={level},agent_client={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let db = DBService::new().await?;
    let runtime = Arc::new(RuntimeClient::from_env());
    let state = AppState { db, runtime };

    // Best-effort catalog sync; the server still comes up when the runtime
    // is unreachable.
    if let Err(e) = sync::sync_mcp_servers(&state).await {
        tracing::warn!("Failed to sync MCP servers on startup: {}", e);
    }
    if let Err(e) = sync::sync_model_servers(&state).await {
        tracing::warn!("Failed to sync model servers on startup: {}", e);
    }
    if let Err(e) = sync::sync_knowledge_bases(&state).await {
        tracing::warn!("Failed to sync knowledge bases on startup: {}", e);
    }

    let app_router = routes::router(state);

    let port = std::env::var("BACKEND_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(8000);
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!("Server running on http://{host}:{port}");

    axum::serve(listener, app_router).await?;
    Ok(())
}
