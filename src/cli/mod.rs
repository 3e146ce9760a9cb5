//! CLI module
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, Verbosity};
pub use config::Config;

impl Config {
    /// Apply command-line overrides on top of the file values
    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.ollama.host = host.clone();
        }
        if let Some(port) = args.port {
            self.ollama.port = port;
        }
        if let Some(model) = &args.model {
            self.models.chat = model.clone();
        }
        if let Some(model) = &args.embedding_model {
            self.models.embedding = model.clone();
        }
    }
}
