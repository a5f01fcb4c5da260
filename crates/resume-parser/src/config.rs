//! Configuration for the resume parser service

use alumni_rag::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "RESUME_PARSER_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeParserConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Prompting and generation
    pub parser: ParserConfig,
    /// Parsed resume storage
    pub storage: StorageConfig,
}

impl Default for ResumeParserConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig {
                generate_model: "tinyllama".to_string(),
                temperature: 0.1,
                ..LlmConfig::default()
            },
            parser: ParserConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ResumeParserConfig {
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

    /// Load using `RESUME_PARSER_CONFIG` (if set) and the process environment
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
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.generate_model = model;
        }
        if let Some(path) = lookup("RESUME_PROMPT_TEMPLATE") {
            self.parser.prompt_template = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("RESUME_DB_PATH") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("RESUME_PERSIST") {
            self.storage.persist_parsed = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
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
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Prompting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Template file containing `{resume_text}`; the built-in template is used when unset
    pub prompt_template: Option<PathBuf>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Seconds allowed for PDF/DOCX text extraction
    pub extract_timeout_secs: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            prompt_template: None,
            max_tokens: 1024,
            extract_timeout_secs: 60,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Save every parsed resume
    pub persist_parsed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("resume-parser")
                .join("alumni.db"),
            persist_parsed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResumeParserConfig::default();
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.parser.max_tokens, 1024);
        assert!(config.storage.persist_parsed);
        assert_eq!(config.llm.max_retries, 0);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ResumeParserConfig::default();
        config
            .apply_overrides(|key| match key {
                "PORT" => Some("9100".to_string()),
                "OLLAMA_MODEL" => Some("llama3:8b".to_string()),
                "RESUME_PERSIST" => Some("false".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.generate_model, "llama3:8b");
        assert!(!config.storage.persist_parsed);
    }

    #[test]
    fn test_partial_toml_keeps_llm_defaults() {
        let config: ResumeParserConfig = toml::from_str(
            r#"
            [parser]
            max_tokens = 512
            "#,
        )
        .unwrap();

        assert_eq!(config.parser.max_tokens, 512);
        assert_eq!(config.llm.generate_model, "tinyllama");
    }
}
