//! Interactive question loop
//!
//! Plain lines go to the assistant; lines starting with `/` are commands.

pub mod commands;
pub mod display;
pub mod input;
pub mod session;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rag::pipeline::{Answer, Assistant};
use crate::repl::commands::{is_command, CommandHandler};
pub use crate::repl::display::{DisplayManager, StoreSummary};
use crate::repl::input::{InputEvent, InputHandler};
pub use crate::repl::session::ReplState;
use crate::session::ContactBook;

/// Configuration for REPL mode
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub history_file: Option<PathBuf>,
    pub contacts_file: PathBuf,
    pub show_progress: bool,
    pub verbose: bool,
    pub display_chars: usize,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            history_file: None,
            contacts_file: PathBuf::from("contacts.csv"),
            show_progress: true,
            verbose: false,
            display_chars: crate::session::DEFAULT_DISPLAY_CHARS,
        }
    }
}

pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    state: ReplState,
    assistant: Arc<Assistant>,
}

impl ReplSession {
    pub fn new(assistant: Arc<Assistant>, config: ReplConfig) -> Result<Self> {
        let input_handler = match config.history_file {
            Some(path) => InputHandler::with_history(path)?,
            None => InputHandler::new()?,
        };
        let stores = assistant
            .retriever()
            .stores()
            .iter()
            .map(StoreSummary::from_store)
            .collect();
        let state = ReplState::new(
            ContactBook::new(config.contacts_file),
            assistant.telemetry().clone(),
            stores,
            config.display_chars,
        );

        Ok(ReplSession {
            input_handler,
            command_handler: CommandHandler::new(config.verbose),
            display_manager: DisplayManager::new(config.show_progress),
            state,
            assistant,
        })
    }

    pub fn show_welcome(&self, version: &str) {
        self.display_manager.show_banner(
            version,
            self.assistant.generator().model_name(),
            self.state.stores(),
        );
    }

    /// Read and handle lines until `/exit` or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let line = match self.input_handler.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    self.display_manager.show_info("Press Ctrl-D or type /exit to quit.");
                    continue;
                }
                InputEvent::Eof => break,
            };

            if !self.handle_input(&line).await? {
                break;
            }
        }

        if let Err(e) = self.save() {
            warn!("Could not save input history: {}", e);
        }
        Ok(())
    }

    /// Returns `false` when the session should end
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            debug!(?command, "REPL command");
            return match self
                .command_handler
                .execute(command, &mut self.state, &self.display_manager)
            {
                Ok(keep_going) => Ok(keep_going),
                Err(e) => {
                    self.display_manager.show_error(&format!("{:#}", e));
                    Ok(true)
                }
            };
        }

        if let Some(answer) = self.ask(input).await {
            self.display_manager
                .show_answer(&answer, self.command_handler.is_verbose());
            self.state.record_answer(&answer);
        }
        Ok(true)
    }

    /// One question; a failure is reported and the turn dropped
    async fn ask(&mut self, question: &str) -> Option<Answer> {
        self.display_manager.start_thinking();
        let result = self.assistant.ask(question).await;
        self.display_manager.finish_thinking();

        match result {
            Ok(answer) => Some(answer),
            Err(e) => {
                self.display_manager
                    .show_error(&format!("Sorry, this question could not be answered: {}", e));
                None
            }
        }
    }

    pub fn state(&self) -> &ReplState {
        &self.state
    }

    pub fn is_verbose(&self) -> bool {
        self.command_handler.is_verbose()
    }

    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }
}
