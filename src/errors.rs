//! Error types for the ESILV assistant
//!
//! Core modules return [`AssistantError`]; the binary and the REPL wrap
//! these in `anyhow` with extra context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the retrieval and grounding pipeline
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Embedding service failed or returned an unusable vector
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// Vector index artifact absent at load time
    #[error("Missing vector index file: {}", .0.display())]
    MissingIndexFile(PathBuf),

    /// id -> document mapping absent at load time
    #[error("Missing mapping file: {}", .0.display())]
    MissingMappingFile(PathBuf),

    /// Index artifact present but unreadable
    #[error("Invalid vector index {}: {reason}", path.display())]
    InvalidIndex { path: PathBuf, reason: String },

    /// Mapping present but not a valid id -> document object
    #[error("Invalid mapping {}: {reason}", path.display())]
    InvalidMapping { path: PathBuf, reason: String },

    /// Nearest-neighbor search rejected the query
    #[error("Index search failed: {0}")]
    IndexSearch(String),

    /// Language model call failed
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApi(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Contact form rejected, one message per failed rule
    #[error("Invalid contact request: {}", .0.join("; "))]
    InvalidContact(Vec<String>),

    /// History export failures
    #[error("Export error: {0}")]
    Export(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Assistant error: {0}")]
    Generic(String),
}

impl AssistantError {
    /// Store loading failures abort startup instead of failing one question.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            AssistantError::MissingIndexFile(_)
                | AssistantError::MissingMappingFile(_)
                | AssistantError::InvalidIndex { .. }
                | AssistantError::InvalidMapping { .. }
        )
    }
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

impl From<anyhow::Error> for AssistantError {
    fn from(err: anyhow::Error) -> Self {
        AssistantError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_display() {
        let err = AssistantError::MissingIndexFile(PathBuf::from("/data/v2/faiss_index.bin"));
        assert!(err.to_string().contains("faiss_index.bin"));
        assert!(err.is_startup_fatal());
    }

    #[test]
    fn test_query_errors_are_not_startup_fatal() {
        assert!(!AssistantError::EmbeddingService("down".to_string()).is_startup_fatal());
        assert!(!AssistantError::GenerationService("down".to_string()).is_startup_fatal());
    }

    #[test]
    fn test_invalid_contact_lists_every_rule() {
        let err = AssistantError::InvalidContact(vec![
            "first name is required".to_string(),
            "consent is required".to_string(),
        ]);
        let text = err.to_string();
        assert!(text.contains("first name"));
        assert!(text.contains("consent"));
    }
}
