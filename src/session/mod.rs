//! Session state at the presentation boundary
//!
//! Components:
//! - History: turns, sources and feedback for the running session
//! - Export: history to JSON or CSV
//! - Contacts: validated contact requests appended to CSV

pub mod contacts;
pub mod export;
pub mod history;

pub use contacts::{ContactBook, ContactRequest, CONFIRMATION};
pub use export::{export, ExportFormat};
pub use history::{ConversationTurn, Feedback, History, SourceRef, DEFAULT_DISPLAY_CHARS};
