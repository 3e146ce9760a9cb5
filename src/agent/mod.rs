//! Agent selection
//!
//! Personas are static prompt profiles; the router picks one per question.

pub mod persona;
pub mod router;

pub use persona::{classify_rubric, Persona};
pub use router::{lexical_override, AgentRouter, RoutingDecision, RoutingReason};
