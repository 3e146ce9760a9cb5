//! Command-line argument parsing
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ESILV assistant - grounded answers about ESILV from local Ollama models
#[derive(Parser, Debug)]
#[command(name = "esilv-assistant")]
#[command(version)]
#[command(about = "Ask questions about ESILV; answers come only from the indexed documents", long_about = None)]
pub struct Args {
    /// Question to answer once, then exit
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Chat model (overrides the config file)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Embedding model (overrides the config file)
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// Ollama host
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long)]
    pub port: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only answers and errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start interactive REPL mode (default)
    Start,

    /// Answer one question and exit
    Ask {
        /// The question
        question: String,
    },

    /// Check Ollama, models and vector stores
    Doctor,

    /// List configured vector stores
    Stores,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Positional question and subcommands are mutually exclusive
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }
        if let Some(Commands::Ask { question }) = &self.command {
            if question.trim().is_empty() {
                return Err("The question must not be empty.".to_string());
            }
        }
        Ok(())
    }

    /// The command to run, with a positional question promoted to `ask`
    pub fn resolved_command(&self) -> Commands {
        match (&self.command, &self.question) {
            (Some(command), _) => command.clone(),
            (None, Some(question)) => Commands::Ask {
                question: question.clone(),
            },
            (None, None) => Commands::Start,
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log filter for this level; `None` keeps the configured default
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("info"),
            Verbosity::VeryVerbose => Some("debug"),
        }
    }

    /// Check if should show the spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show routing and timing details
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
