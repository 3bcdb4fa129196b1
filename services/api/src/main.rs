use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod mailer;
mod middleware;
mod models;
mod query;
mod repositories;
mod routes;
mod state;
mod tokens;
mod validation;

use std::sync::Arc;

use common::store::MemoryStore;

use crate::mailer::LogMailer;
use crate::state::{AppState, bootstrap_store};
use crate::tokens::TokenConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Campdex API service");

    // Token signing material is read once here and injected; nothing else
    // touches the environment after startup.
    let token_config = TokenConfig::from_env()?;

    let store = MemoryStore::new();
    bootstrap_store(&store).await?;

    let app_state = AppState::new(store, &token_config, Arc::new(LogMailer));

    // Start the web server
    let app = routes::create_router(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(5000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Campdex API listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
