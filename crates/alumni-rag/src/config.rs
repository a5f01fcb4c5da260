//! Configuration for the alumni RAG service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "ALUMNI_RAG_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Record store configuration
    pub store: StoreConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Vector index persistence
    pub index: IndexConfig,
    /// Retrieval parameters
    pub retrieval: RetrievalConfig,
    /// Index refresh policy
    pub refresh: RefreshConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("Invalid {}: {}", path.display(), e)))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load using `ALUMNI_RAG_CONFIG` (if set) and the process environment
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load(path.as_deref())
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(path) = lookup("ALUMNI_DB_PATH") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(collection) = lookup("COLLECTION_NAME") {
            self.store.collection = collection;
        }
        if let Some(seed) = lookup("ALUMNI_SEED_FILE") {
            self.store.seed_file = Some(PathBuf::from(seed));
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.generate_model = model;
        }
        if let Some(model) = lookup("EMBEDDINGS_MODEL") {
            self.llm.embed_model = model;
        }
        if let Some(backend) = lookup("EMBEDDINGS_BACKEND") {
            self.embeddings.backend = match backend.to_lowercase().as_str() {
                "ollama" => EmbeddingBackend::Ollama,
                "hashing" => EmbeddingBackend::Hashing,
                other => {
                    return Err(Error::Config(format!("Unknown embeddings backend: {}", other)))
                }
            };
        }
        if let Some(dir) = lookup("INDEX_DATA_DIR") {
            self.index.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Directory holding the index snapshots for the configured collection
    pub fn snapshot_dir(&self) -> PathBuf {
        self.index
            .data_dir
            .join(format!("vectorstore_{}", self.store.collection))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Collection (table) holding alumni records
    pub collection: String,
    /// JSON file with records inserted when the collection is empty
    pub seed_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_data_dir().join("alumni_db.sqlite"),
            collection: "alumni".to_string(),
            seed_file: None,
        }
    }
}

/// Which embedding provider to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama `/api/embeddings`
    #[default]
    Ollama,
    /// Local feature-hashing embedder (deterministic, no model server)
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider backend
    pub backend: EmbeddingBackend,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Documents embedded per batch during a rebuild
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            dimensions: 384,
            batch_size: 32,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "all-minilm".to_string(),
            generate_model: "llama3:8b".to_string(),
            temperature: 0.3, // Lower for more factual answers
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// Vector index persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base directory for index snapshots
    pub data_dir: PathBuf,
    /// Write a snapshot after every mutation
    pub persist: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist: true,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of projected records handed to the model
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// How a stale index is brought up to date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Queries wake the refresher and keep reading the published snapshot
    #[default]
    Background,
    /// Queries rebuild before retrieving
    Inline,
}

/// Index refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Refresh policy
    pub mode: RefreshMode,
    /// Seconds between freshness polls of the background refresher (0 disables polling)
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            mode: RefreshMode::Background,
            interval_secs: 30,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alumni-rag")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9001"),
            ("COLLECTION_NAME", "graduates"),
            ("OLLAMA_MODEL", "llama3.2:3b"),
            ("EMBEDDINGS_BACKEND", "hashing"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.store.collection, "graduates");
        assert_eq!(config.llm.generate_model, "llama3.2:3b");
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Hashing);
        assert!(config.snapshot_dir().ends_with("vectorstore_graduates"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = RagConfig::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [retrieval]
            top_k = 8

            [refresh]
            mode = "inline"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.refresh.mode, RefreshMode::Inline);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.max_retries, 0);
    }
}
