mod config;
mod editing;
mod errors;
mod generation;
mod github;
mod ingest;
mod layout;
mod llm_client;
mod models;
mod render;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::editing::CommandInterpreter;
use crate::github::GithubClient;
use crate::layout::default_page_config;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resumebot v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm: Arc<dyn TextGenerator> = Arc::new(LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_timeout,
    )?);
    info!(
        "LLM client initialized (model: {}, fallback: {})",
        config.llm_model, config.llm_fallback_model
    );

    let interpreter = CommandInterpreter::new(
        llm.clone(),
        config.llm_model.clone(),
        config.chat_parse_attempts,
        config.chat_retry_backoff,
    );

    let github = GithubClient::new(config.github_api_url.clone(), config.github_token.clone())?;
    info!("GitHub client initialized ({})", config.github_api_url);

    let page_config = default_page_config(config.export_font);
    info!("Export font: {:?}", page_config.font);

    let state = AppState {
        config: config.clone(),
        llm,
        interpreter,
        github,
        sessions: SessionStore::new(),
        page_config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
