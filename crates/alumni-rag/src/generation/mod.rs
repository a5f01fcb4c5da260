//! Answer generation using Ollama

pub mod ollama;
pub mod prompt;

pub use ollama::OllamaClient;
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
