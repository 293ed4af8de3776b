mod config;
mod error;
mod models;
mod openai;
mod orchestrator;
mod prompts;
mod routes;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    config::AppConfig,
    openai::{OpenAiClient, TextProvider},
    orchestrator::Orchestrator,
    prompts::PromptTemplates,
    routes::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    let templates = PromptTemplates::load(config.template_dir.as_deref())?;

    let provider: Option<Arc<dyn TextProvider>> = match &config.api_key {
        Some(api_key) => {
            let prefix: String = api_key.chars().take(7).collect();
            tracing::info!("Using API key: {}... with model {}", prefix, config.provider.model);
            let client = OpenAiClient::new(api_key.clone(), &config.provider)?;
            Some(Arc::new(client) as Arc<dyn TextProvider>)
        }
        None => {
            tracing::warn!(
                "OPENAI_API_KEY is not set; generation requests will fail until it is configured"
            );
            None
        }
    };

    let state = AppState { orchestrator: Arc::new(Orchestrator::new(templates, provider)) };
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
