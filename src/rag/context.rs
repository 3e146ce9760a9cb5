//! Context builder: ranked hits -> bounded, source-attributed context block

use serde::{Deserialize, Serialize};

use crate::rag::retrieval::Hit;

/// Snippet budget for the answer pipeline
pub const DEFAULT_SNIPPET_CHARS: usize = 1100;

/// Context assembly configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Characters of document content kept per hit
    pub snippet_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

/// Turns ranked hits into one line per hit: `- [store] snippet (source: url)`
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn with_snippet_chars(snippet_chars: usize) -> Self {
        Self::with_config(ContextConfig { snippet_chars })
    }

    /// Keeps ranking order; empty input gives an empty string
    pub fn build(&self, hits: &[Hit]) -> String {
        hits.iter()
            .map(|hit| {
                format!(
                    "- [{}] {} (source: {})",
                    hit.store,
                    snippet(&hit.document.content, self.config.snippet_chars),
                    hit.document.url
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ContextConfig) {
        self.config = config;
    }
}

/// First `max_chars` characters with line breaks flattened to spaces
pub fn snippet(content: &str, max_chars: usize) -> String {
    let truncated: String = content.chars().take(max_chars).collect();
    truncated.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
