//! ESILV assistant - grounded answers about ESILV from local Ollama models
//!
//! # Architecture
//!
//! - **store / embedding**: FAISS flat indexes and their id -> document mappings,
//!   queried with unit-norm question embeddings
//! - **rag**: multi-store retrieval, context assembly, generation and the
//!   grounding guardrail, tied together by [`rag::Assistant`]
//! - **agent**: the admissions, programs and international personas and the
//!   router that picks one per question
//! - **session / repl / cli**: conversation history, export, contact capture and
//!   the terminal front end

pub mod errors;
pub mod logging;
pub mod ollama;
pub mod embedding;
pub mod store;
pub mod rag;
pub mod agent;
pub mod telemetry;
pub mod session;
pub mod cli;
pub mod repl;
pub mod doctor;

// Re-export commonly used types
pub use errors::{AssistantError, Result};
pub use agent::Persona;
pub use rag::{Answer, Assistant};
