//! Ollama API client
//!
//! Endpoints used:
//! - POST /api/embeddings (question embedding)
//! - POST /api/chat (persona + context generation)
//! - POST /api/generate (single-prompt generation, older integration)
//! - GET /api/version, GET /api/tags (diagnostics)

use crate::embedding::EmbeddingBackend;
use crate::errors::{AssistantError, Result};
use crate::ollama::types::{
    ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, GenerateRequest,
    GenerateResponse, ModelsResponse,
};
use crate::rag::generator::{ChatMessage, LanguageModel};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2:3b";

/// Generation on a small local model can take a while
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama HTTP client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embedding_model: String,
    chat_model: String,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(
            DEFAULT_OLLAMA_URL,
            DEFAULT_EMBEDDING_MODEL,
            DEFAULT_CHAT_MODEL,
            DEFAULT_TIMEOUT,
        )
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(
        base_url: &str,
        embedding_model: &str,
        chat_model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AssistantError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model: embedding_model.to_string(),
            chat_model: chat_model.to_string(),
        })
    }

    /// Raw embedding vector for `text`
    pub async fn embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to send request: {}", e)))?;

        let body: EmbeddingsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to parse embedding: {}", e)))?;

        Ok(body.embedding)
    }

    /// Chat completion, returns the assistant message content verbatim
    pub async fn chat_messages(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to send request: {}", e)))?;

        let body: ChatResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to parse chat reply: {}", e)))?;

        Ok(body.message.content)
    }

    /// Single-prompt completion, returns the response text verbatim
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.chat_model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to send request: {}", e)))?;

        let body: GenerateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to parse completion: {}", e)))?;

        Ok(body.response)
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to list models: {}", e)))?;

        let models: ModelsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::OllamaApi(format!("Failed to parse models: {}", e)))?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AssistantError::OllamaApi(format!("HTTP {}: {}", status, error_text)))
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings(text).await
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.chat_messages(messages).await
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.embedding_model(), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(client.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_client_with_config_trims_slash() {
        let client = OllamaClient::with_config(
            "http://localhost:8080/",
            "nomic-embed-text",
            "qwen2.5:7b-instruct",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.embedding_model(), "nomic-embed-text");
        assert_eq!(client.chat_model(), "qwen2.5:7b-instruct");
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_unhealthy() {
        let client = OllamaClient::with_config(
            "http://127.0.0.1:1",
            DEFAULT_EMBEDDING_MODEL,
            DEFAULT_CHAT_MODEL,
            Duration::from_millis(500),
        )
        .unwrap();
        assert!(!client.health_check().await.unwrap());
        assert!(client.embeddings("bonjour").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires Ollama running
    async fn test_embeddings_integration() {
        let client = OllamaClient::new().unwrap();
        let vector = client.embeddings("hello world").await.unwrap();
        assert!(!vector.is_empty());
    }
}
