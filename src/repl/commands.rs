//! Slash commands for the REPL

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::repl::display::DisplayManager;
use crate::repl::session::ReplState;
use crate::session::{export, ContactRequest, ExportFormat};

const DEFAULT_HISTORY_LIMIT: usize = 10;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    History { limit: Option<usize> },
    Sources,
    Feedback { useful: bool, comment: Option<String> },
    Export { format: ExportFormat, path: PathBuf },
    Contact { first_name: String, last_name: String, email: String, consent: bool },
    Status,
    Reset,
    Clear,
    Stores,
    /// `None` toggles
    Verbose { enable: Option<bool> },
    /// Known command, wrong arguments
    Invalid { usage: &'static str },
    Unknown { input: String },
}

pub struct CommandHandler {
    verbose: bool,
}

impl CommandHandler {
    pub fn new(verbose: bool) -> Self {
        CommandHandler { verbose }
    }

    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown { input: input.to_string() };
        };

        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "history" => match args.first() {
                None => Command::History { limit: None },
                Some(n) => match n.parse() {
                    Ok(limit) => Command::History { limit: Some(limit) },
                    Err(_) => Command::Invalid { usage: "/history [n]" },
                },
            },
            "sources" => Command::Sources,
            "feedback" => parse_feedback(rest),
            "export" => parse_export(&args),
            "contact" => parse_contact(&args),
            "status" => Command::Status,
            "reset" => Command::Reset,
            "clear" | "cls" => Command::Clear,
            "stores" => Command::Stores,
            "verbose" => match args.first().map(|s| s.to_lowercase()) {
                None => Command::Verbose { enable: None },
                Some(flag) => match flag.as_str() {
                    "on" | "1" | "true" => Command::Verbose { enable: Some(true) },
                    "off" | "0" | "false" => Command::Verbose { enable: Some(false) },
                    _ => Command::Invalid { usage: "/verbose [on|off]" },
                },
            },
            _ => Command::Unknown { input: input.to_string() },
        }
    }

    /// Returns `false` when the REPL should stop
    pub fn execute(
        &mut self,
        command: Command,
        state: &mut ReplState,
        display: &DisplayManager,
    ) -> Result<bool> {
        match command {
            Command::Help => self.show_help(),
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return Ok(false);
            }
            Command::History { limit } => {
                display.show_history(
                    state
                        .history()
                        .newest_first(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
                );
            }
            Command::Sources => match state.history().latest() {
                Some(turn) => display.show_sources(turn),
                None => display.show_warning("Ask a question first."),
            },
            Command::Feedback { useful, comment } => {
                if state.history_mut().record_feedback(useful, comment) {
                    display.show_success("Thanks, your feedback was recorded.");
                } else {
                    display.show_warning("There is no answer to rate yet.");
                }
            }
            Command::Export { format, path } => {
                if state.history().is_empty() {
                    display.show_warning("Nothing to export yet.");
                } else {
                    export(state.history(), format, &path)?;
                    display.show_success(&format!(
                        "Exported {} turns as {} to {}",
                        state.history().len(),
                        format,
                        path.display()
                    ));
                }
            }
            Command::Contact {
                first_name,
                last_name,
                email,
                consent,
            } => {
                let request = ContactRequest::new(first_name, last_name, email, consent);
                state.register_contact(&request)?;
                if let Some(turn) = state.history().latest() {
                    display.show_success(&turn.answer);
                }
            }
            Command::Status => {
                display.show_status(
                    &state.telemetry().get_stats(),
                    state.history().len(),
                    state.uptime(),
                    self.verbose,
                );
            }
            Command::Reset => {
                state.reset();
                println!("{}", "Session reset. History cleared.".yellow());
            }
            Command::Clear => display.clear_screen()?,
            Command::Stores => display.show_stores(state.stores()),
            Command::Verbose { enable } => {
                self.verbose = enable.unwrap_or(!self.verbose);
                let status = if self.verbose { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
            }
            Command::Invalid { usage } => {
                display.show_warning(&format!("Usage: {}", usage));
            }
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/history [n]", "Show the last n questions (default: 10)"),
            ("/sources", "Show the sources of the last answer"),
            ("/feedback useful|notuseful [comment]", "Rate the last answer"),
            ("/export json|csv [path]", "Save the conversation"),
            ("/contact <first> <last> <email> yes", "Ask ESILV to contact you"),
            ("/status", "Show session statistics"),
            ("/stores", "Show the loaded vector stores"),
            ("/reset", "Clear the conversation"),
            ("/verbose [on|off]", "Show routing and guardrail details"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<38} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type your question directly (no / prefix)");
        println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
        println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, enable: bool) {
        self.verbose = enable;
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

fn parse_feedback(rest: &str) -> Command {
    const USAGE: &str = "/feedback useful|notuseful [comment]";
    let (rating, comment) = match rest.split_once(char::is_whitespace) {
        Some((rating, comment)) => (rating, Some(comment.trim().to_string())),
        None => (rest, None),
    };
    let useful = match rating.to_lowercase().as_str() {
        "useful" | "yes" | "+" | "up" => true,
        "notuseful" | "not-useful" | "no" | "-" | "down" => false,
        _ => return Command::Invalid { usage: USAGE },
    };
    Command::Feedback {
        useful,
        comment: comment.filter(|c| !c.is_empty()),
    }
}

fn parse_export(args: &[&str]) -> Command {
    const USAGE: &str = "/export json|csv [path]";
    let Some(format) = args.first().and_then(|f| f.parse::<ExportFormat>().ok()) else {
        return Command::Invalid { usage: USAGE };
    };
    let path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(format!("esilv_conversation.{}", format)),
    };
    Command::Export { format, path }
}

fn parse_contact(args: &[&str]) -> Command {
    match args {
        [first, last, email, rest @ ..] => Command::Contact {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            consent: rest
                .first()
                .map(|c| matches!(c.to_lowercase().as_str(), "yes" | "oui" | "y" | "true"))
                .unwrap_or(false),
        },
        _ => Command::Invalid {
            usage: "/contact <first> <last> <email> yes",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Persona;
    use crate::session::{ContactBook, ConversationTurn};
    use crate::telemetry::TelemetryCollector;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> ReplState {
        ReplState::new(
            ContactBook::new(dir.path().join("contacts.csv")),
            TelemetryCollector::new(),
            Vec::new(),
            200,
        )
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /help"));
        assert!(!is_command("help"));
        assert!(!is_command("Quels sont les frais de scolarité ?"));
    }

    #[test]
    fn test_parse_simple_commands() {
        let handler = CommandHandler::default();
        assert_eq!(handler.parse("/h"), Command::Help);
        assert_eq!(handler.parse("/quit"), Command::Exit);
        assert_eq!(handler.parse("/sources"), Command::Sources);
        assert_eq!(handler.parse("/STATUS"), Command::Status);
        assert_eq!(handler.parse("/stores"), Command::Stores);
        assert_eq!(handler.parse("/cls"), Command::Clear);
    }

    #[test]
    fn test_parse_history() {
        let handler = CommandHandler::default();
        assert_eq!(handler.parse("/history"), Command::History { limit: None });
        assert_eq!(handler.parse("/history 5"), Command::History { limit: Some(5) });
        assert!(matches!(handler.parse("/history many"), Command::Invalid { .. }));
    }

    #[test]
    fn test_parse_feedback_keeps_comment_spacing() {
        let handler = CommandHandler::default();
        assert_eq!(
            handler.parse("/feedback notuseful  missing the  fees"),
            Command::Feedback {
                useful: false,
                comment: Some("missing the  fees".to_string())
            }
        );
        assert_eq!(
            handler.parse("/feedback useful"),
            Command::Feedback { useful: true, comment: None }
        );
        assert!(matches!(handler.parse("/feedback maybe"), Command::Invalid { .. }));
    }

    #[test]
    fn test_parse_export() {
        let handler = CommandHandler::default();
        assert_eq!(
            handler.parse("/export csv out/history.csv"),
            Command::Export {
                format: ExportFormat::Csv,
                path: PathBuf::from("out/history.csv")
            }
        );
        assert_eq!(
            handler.parse("/export json"),
            Command::Export {
                format: ExportFormat::Json,
                path: PathBuf::from("esilv_conversation.json")
            }
        );
        assert!(matches!(handler.parse("/export xml"), Command::Invalid { .. }));
    }

    #[test]
    fn test_parse_contact() {
        let handler = CommandHandler::default();
        assert_eq!(
            handler.parse("/contact Ada Lovelace ada@example.com yes"),
            Command::Contact {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                consent: true
            }
        );
        match handler.parse("/contact Ada Lovelace ada@example.com") {
            Command::Contact { consent, .. } => assert!(!consent),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(handler.parse("/contact Ada"), Command::Invalid { .. }));
    }

    #[test]
    fn test_parse_verbose() {
        let handler = CommandHandler::default();
        assert_eq!(handler.parse("/verbose"), Command::Verbose { enable: None });
        assert_eq!(handler.parse("/verbose on"), Command::Verbose { enable: Some(true) });
        assert_eq!(handler.parse("/verbose off"), Command::Verbose { enable: Some(false) });
    }

    #[test]
    fn test_parse_unknown_and_plain_text() {
        let handler = CommandHandler::default();
        assert!(matches!(handler.parse("/frobnicate"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("admissions"), Command::Unknown { .. }));
    }

    #[test]
    fn test_execute_exit_stops_loop() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut handler = CommandHandler::default();
        let display = DisplayManager::new(false);
        assert!(!handler.execute(Command::Exit, &mut state, &display).unwrap());
        assert!(handler.execute(Command::Help, &mut state, &display).unwrap());
    }

    #[test]
    fn test_execute_verbose_toggle() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut handler = CommandHandler::default();
        let display = DisplayManager::new(false);

        handler
            .execute(Command::Verbose { enable: None }, &mut state, &display)
            .unwrap();
        assert!(handler.is_verbose());
        handler
            .execute(Command::Verbose { enable: Some(false) }, &mut state, &display)
            .unwrap();
        assert!(!handler.is_verbose());
    }

    #[test]
    fn test_execute_feedback_and_export() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut handler = CommandHandler::default();
        let display = DisplayManager::new(false);
        state
            .history_mut()
            .push(ConversationTurn::note("Quels doubles diplômes ?", "Voir la brochure.", Persona::Formations));

        let feedback = handler.parse("/feedback useful clear answer");
        handler.execute(feedback, &mut state, &display).unwrap();
        let rated = state.history().latest().unwrap().feedback.clone().unwrap();
        assert_eq!(rated.useful, Some(true));
        assert_eq!(rated.comment.as_deref(), Some("clear answer"));

        let path = dir.path().join("export").join("history.json");
        let command = Command::Export {
            format: ExportFormat::Json,
            path: path.clone(),
        };
        handler.execute(command, &mut state, &display).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("Quels doubles diplômes ?"));
    }

    #[test]
    fn test_execute_contact_rejection_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut handler = CommandHandler::default();
        let display = DisplayManager::new(false);
        let command = handler.parse("/contact Ada Lovelace nope");
        assert!(handler.execute(command, &mut state, &display).is_err());
        assert!(state.history().is_empty());
    }
}
