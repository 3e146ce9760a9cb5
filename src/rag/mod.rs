//! Retrieval-augmented answering
//!
//! Components:
//! - Retrieval: embed once, search every store, merge, dedupe, rank
//! - Context Builder: ranked hits to a bounded, source-attributed block
//! - Generator: persona + context + question to the language model
//! - Guardrail: reject empty, fabricated-procedure and uncited answers
//! - Pipeline: route, retrieve, generate, verify

pub mod context;
pub mod generator;
pub mod guardrail;
pub mod pipeline;
pub mod retrieval;

pub use context::{ContextBuilder, ContextConfig};
pub use generator::{ChatMessage, GenerationTransport, Generator, LanguageModel};
pub use guardrail::{Guardrail, GuardrailOutcome, Verdict, REFUSAL};
pub use pipeline::{Answer, Assistant, PipelineConfig};
pub use retrieval::{Hit, MultiStoreRetriever, SearchParams};
