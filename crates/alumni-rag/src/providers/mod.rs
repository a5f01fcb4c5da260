//! Provider abstractions for embeddings, LLM and the record store
//!
//! Trait-based seams that allow switching between the Ollama backends and
//! local stand-ins used offline and in tests.

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod ollama;
pub mod record_store;

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use llm::{ChatMessage, ChatRole, GenerationOptions, LlmProvider};
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use record_store::RecordStore;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::Result;
use crate::generation::OllamaClient;

/// Build the configured embedder and LLM, sharing one Ollama client
pub fn from_config(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    let client = Arc::new(OllamaClient::new(&config.llm)?);

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::from_client(
            Arc::clone(&client),
            config.embeddings.dimensions,
        )),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)),
    };
    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::from_client(client));

    Ok((embedder, llm))
}
