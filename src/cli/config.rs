//! Configuration management for the ESILV assistant
//!
//! TOML configuration with defaults and validation.
//! Location: ~/.esilv-assistant/config.toml

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AssistantError, Result};
use crate::ollama::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use crate::rag::context::ContextConfig;
use crate::rag::generator::GenerationTransport;
use crate::rag::pipeline::PipelineConfig;
use crate::rag::retrieval::SearchParams;
use crate::session::DEFAULT_DISPLAY_CHARS;
use crate::store::StoreSpec;

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub models: ModelsConfig,
    pub stores: Vec<StoreSpec>,
    pub retrieval: SearchParams,
    pub routing: SearchParams,
    pub context: ContextConfig,
    pub display: DisplayConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

/// Ollama connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

/// Models used for embedding and generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub embedding: String,
    pub chat: String,
    pub transport: GenerationTransport,
    /// Expected embedding length; unchecked when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

/// Terminal output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub source_chars: usize,
    pub color_output: bool,
}

/// File system paths configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
    pub history_file: String,
    pub contacts_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            models: ModelsConfig::default(),
            stores: default_stores(),
            retrieval: SearchParams::ANSWER,
            routing: SearchParams::ROUTING,
            context: ContextConfig::default(),
            display: DisplayConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_stores() -> Vec<StoreSpec> {
    vec![
        StoreSpec {
            name: "v2_site".to_string(),
            path: PathBuf::from("embeddings/vector_store_v2"),
        },
        StoreSpec {
            name: "v3_pdf".to_string(),
            path: PathBuf::from("embeddings/vector_store_v3"),
        },
    ]
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            embedding: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat: DEFAULT_CHAT_MODEL.to_string(),
            transport: GenerationTransport::Chat,
            dimension: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            source_chars: DEFAULT_DISPLAY_CHARS,
            color_output: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.esilv-assistant".to_string(),
            history_file: "~/.esilv-assistant/repl_history".to_string(),
            contacts_file: "~/.esilv-assistant/contacts/contacts.csv".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(&config_path),
            None => Self::load_default(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AssistantError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Read the default file, writing built-in defaults there on first run
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            Some(config_path) => {
                let config = Config::default();
                if let Err(e) = config.save(&config_path) {
                    tracing::warn!(error = %e, "Could not write default config");
                }
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".esilv-assistant").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        for (section, params) in [("retrieval", self.retrieval), ("routing", self.routing)] {
            if params.per_store_k == 0 {
                return Err(AssistantError::Config(format!(
                    "{}.per_store_k must be greater than 0",
                    section
                )));
            }
            if params.total_k < 1 {
                return Err(AssistantError::Config(format!(
                    "{}.total_k must be at least 1",
                    section
                )));
            }
        }

        if self.stores.is_empty() {
            return Err(AssistantError::Config("at least one store must be configured".to_string()));
        }

        let mut seen = HashSet::new();
        for store in &self.stores {
            if store.name.trim().is_empty() {
                return Err(AssistantError::Config("store names must not be empty".to_string()));
            }
            if !seen.insert(store.name.as_str()) {
                return Err(AssistantError::Config(format!("duplicate store name: {}", store.name)));
            }
        }

        if self.context.snippet_chars == 0 {
            return Err(AssistantError::Config(
                "context.snippet_chars must be greater than 0".to_string(),
            ));
        }

        if self.ollama.timeout_secs == 0 {
            return Err(AssistantError::Config("ollama.timeout_secs must be greater than 0".to_string()));
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AssistantError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AssistantError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.timeout_secs)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            retrieval: self.retrieval,
            routing: self.routing,
            context: self.context,
            transport: self.models.transport,
        }
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    pub fn history_file(&self) -> PathBuf {
        Self::expand_path(&self.paths.history_file)
    }

    pub fn contacts_file(&self) -> PathBuf {
        Self::expand_path(&self.paths.contacts_file)
    }

    /// Store specs with `~/` expanded in their paths
    pub fn resolved_stores(&self) -> Vec<StoreSpec> {
        self.stores
            .iter()
            .map(|spec| StoreSpec {
                name: spec.name.clone(),
                path: Self::expand_path(&spec.path.to_string_lossy()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "127.0.0.1");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.models.embedding, "mxbai-embed-large");
        assert_eq!(config.stores.len(), 2);
        assert_eq!(config.retrieval, SearchParams::ANSWER);
        assert_eq!(config.routing, SearchParams::ROUTING);
        assert_eq!(config.context.snippet_chars, 1100);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_k() {
        let mut config = Config::default();
        config.retrieval.per_store_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routing.total_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_stores() {
        let mut config = Config::default();
        config.stores.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stores[1].name = "v2_site".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_snippet_budget() {
        let mut config = Config::default();
        config.context.snippet_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[models]
chat = "mistral:7b"
transport = "completion"

[[stores]]
name = "site"
path = "/data/site"
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.models.chat, "mistral:7b");
        assert_eq!(config.models.embedding, "mxbai-embed-large");
        assert_eq!(config.models.transport, GenerationTransport::Completion);
        assert_eq!(config.stores.len(), 1);
        assert_eq!(config.retrieval.total_k, 10);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.models.dimension = Some(1024);
        config.save(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_ollama_url() {
        assert_eq!(Config::default().ollama_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_expand_path() {
        assert!(!Config::expand_path("~/.esilv-assistant").to_string_lossy().contains('~'));
        assert_eq!(Config::expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
