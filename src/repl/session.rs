//! State carried across REPL turns
//!
//! Conversation history, contact capture and the store summary shown by `/stores`.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::agent::Persona;
use crate::rag::pipeline::Answer;
use crate::repl::display::StoreSummary;
use crate::session::{ContactBook, ContactRequest, ConversationTurn, History, CONFIRMATION};
use crate::store::Store;
use crate::telemetry::TelemetryCollector;

impl StoreSummary {
    pub fn from_store(store: &Store) -> Self {
        let index = store.index();
        StoreSummary {
            name: store.name().to_string(),
            documents: store.document_count(),
            vectors: index.len(),
            dimension: index.dimension(),
            metric: index.metric().to_string(),
        }
    }
}

pub struct ReplState {
    history: History,
    contacts: ContactBook,
    telemetry: TelemetryCollector,
    stores: Vec<StoreSummary>,
    display_chars: usize,
    started: Instant,
}

impl ReplState {
    pub fn new(
        contacts: ContactBook,
        telemetry: TelemetryCollector,
        stores: Vec<StoreSummary>,
        display_chars: usize,
    ) -> Self {
        ReplState {
            history: History::new(),
            contacts,
            telemetry,
            stores,
            display_chars,
            started: Instant::now(),
        }
    }

    /// Append the turn for a finished answer
    pub fn record_answer(&mut self, answer: &Answer) {
        self.history
            .push(ConversationTurn::from_answer(answer, self.display_chars));
    }

    /// Validate and store a contact, then log a confirmation turn
    pub fn register_contact(&mut self, request: &ContactRequest) -> Result<()> {
        self.contacts.append(request)?;
        self.history.push(ConversationTurn::note(
            format!("(Registration) {} {}", request.first_name, request.last_name),
            CONFIRMATION,
            Persona::Admissions,
        ));
        Ok(())
    }

    /// Forget the conversation and the counters
    pub fn reset(&mut self) {
        self.history.reset();
        self.telemetry.reset();
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn contacts(&self) -> &ContactBook {
        &self.contacts
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn stores(&self) -> &[StoreSummary] {
        &self.stores
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
