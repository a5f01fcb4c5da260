//! Resume parser server binary
//!
//! Run with: cargo run -p resume-parser --bin resume-parser-server

use std::sync::Arc;

use alumni_rag::providers::{LlmProvider, OllamaLlm};
use resume_parser::{
    prompt::PromptTemplate, server::ResumeServer, ResumeDb, ResumeParser, ResumeParserConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resume_parser=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ResumeParserConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Database: {}", config.storage.database_path.display());

    let template = PromptTemplate::load(config.parser.prompt_template.as_deref())?;
    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::new(&config.llm)?);

    if llm.health_check().await.unwrap_or(false) {
        tracing::info!("Ollama is running at {}", config.llm.base_url);
    } else {
        tracing::warn!(
            "Ollama not available at {}; run `ollama pull {}`",
            config.llm.base_url,
            config.llm.generate_model
        );
    }

    let db = match ResumeDb::open(&config.storage.database_path) {
        Ok(db) => Some(db),
        Err(e) => {
            // parsing still works without storage
            tracing::error!("Resume storage unavailable: {}", e);
            None
        }
    };

    let parser = ResumeParser::new(llm, template, &config);
    let server = ResumeServer::new(config, parser, db);
    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start(shutdown_signal()).await?;
    tracing::info!("Shutting down resume parser...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
