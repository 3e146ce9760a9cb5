//! Generator: persona + context + question -> raw model text

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::{AssistantError, Result};
use crate::rag::guardrail::REFUSAL;

/// One chat message in the Ollama shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Language model seam. Both shapes must be served by any backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Which call shape carries the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationTransport {
    /// System message + user message
    #[default]
    Chat,
    /// Single prompt, persona prepended
    Completion,
}

impl fmt::Display for GenerationTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationTransport::Chat => write!(f, "chat"),
            GenerationTransport::Completion => write!(f, "completion"),
        }
    }
}

impl FromStr for GenerationTransport {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(GenerationTransport::Chat),
            "completion" | "generate" => Ok(GenerationTransport::Completion),
            other => Err(AssistantError::Config(format!(
                "unknown generation transport: {}",
                other
            ))),
        }
    }
}

/// Sends one grounded request; no retries, no parsing
#[derive(Clone)]
pub struct Generator {
    model: Arc<dyn LanguageModel>,
    transport: GenerationTransport,
}

impl Generator {
    pub fn new(model: Arc<dyn LanguageModel>, transport: GenerationTransport) -> Self {
        Self { model, transport }
    }

    pub async fn generate(&self, context: &str, question: &str, persona_prompt: &str) -> Result<String> {
        let user = Self::user_message(context, question);
        let reply = match self.transport {
            GenerationTransport::Chat => {
                let messages = [ChatMessage::system(persona_prompt), ChatMessage::user(user)];
                self.model.chat(&messages).await
            }
            GenerationTransport::Completion => {
                let prompt = format!("{}\n\n{}", persona_prompt.trim(), user);
                self.model.complete(&prompt).await
            }
        };

        reply.map_err(|e| match e {
            AssistantError::GenerationService(_) => e,
            other => AssistantError::GenerationService(other.to_string()),
        })
    }

    /// Context, question and the grounding rules
    pub fn user_message(context: &str, question: &str) -> String {
        format!(
            "CONTEXT:\n{context}\n\n\
             QUESTION:\n{question}\n\n\
             Rules:\n\
             - Answer only from the CONTEXT.\n\
             - If the CONTEXT does not contain the answer, reply exactly: \"{REFUSAL}\"\n\
             - Never invent anything.\n\
             - If you answer, cite at least one URL present in the CONTEXT (https://... or document://...).\n"
        )
    }

    pub fn transport(&self) -> GenerationTransport {
        self.transport
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }
}
