//! Alumni RAG server binary
//!
//! Run with: cargo run -p alumni-rag --bin alumni-rag-server

use std::sync::Arc;

use alumni_rag::{
    config::{RagConfig, RefreshMode},
    providers,
    server::RagServer,
    service::{spawn_refresher, AlumniRagService},
    storage::{seed_if_empty, SqliteRecordStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alumni_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.store.database_path.display());
    tracing::info!("  - Collection: {}", config.store.collection);
    tracing::info!(
        "  - Embeddings: {:?} ({}, {} dims)",
        config.embeddings.backend,
        config.llm.embed_model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Refresh mode: {:?}", config.refresh.mode);

    // An unreachable store at startup is fatal
    let store = Arc::new(SqliteRecordStore::open(
        &config.store.database_path,
        &config.store.collection,
    )?);

    if let Some(seed) = &config.store.seed_file {
        seed_if_empty(store.as_ref(), seed).await?;
    }

    let (embedder, llm) = providers::from_config(&config)?;

    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    if llm.health_check().await.unwrap_or(false) {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!(
            "  Start it with `ollama serve`, then `ollama pull {}` and `ollama pull {}`",
            config.llm.embed_model,
            config.llm.generate_model
        );
    }

    let service = Arc::new(AlumniRagService::new(store, embedder, llm, config.clone()));
    if let Err(e) = service.initialize().await {
        // queries build the index on demand once the dependencies are back
        tracing::error!("Initial index build failed: {}", e);
    }

    let refresher = match config.refresh.mode {
        RefreshMode::Background => Some(spawn_refresher(Arc::clone(&service))),
        RefreshMode::Inline => None,
    };

    let server = RagServer::new(service);
    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start(shutdown_signal()).await?;

    if let Some(refresher) = refresher {
        refresher.shutdown().await;
    }
    tracing::info!("Shutting down Alumni RAG API...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
