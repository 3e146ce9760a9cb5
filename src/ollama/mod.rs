//! Ollama API client
//!
//! Provides embeddings, chat and single-prompt completion calls against a
//! local Ollama server.

pub mod client;
pub mod types;

pub use client::{OllamaClient, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_OLLAMA_URL};
