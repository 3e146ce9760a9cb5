//! Terminal output for the REPL and one-shot answers

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

use crate::rag::guardrail::GuardrailOutcome;
use crate::rag::pipeline::Answer;
use crate::session::{ConversationTurn, SourceRef};
use crate::telemetry::TelemetryStats;
use crate::agent::Persona;

/// One configured store as shown by `/stores`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub name: String,
    pub documents: usize,
    pub vectors: usize,
    pub dimension: usize,
    pub metric: String,
}

pub struct DisplayManager {
    spinner: Option<ProgressBar>,
    show_progress: bool,
}

impl DisplayManager {
    pub fn new(show_progress: bool) -> Self {
        DisplayManager {
            spinner: None,
            show_progress,
        }
    }

    /// Turn colours on or off for the whole process
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    pub fn show_banner(&self, version: &str, model: &str, stores: &[StoreSummary]) {
        let width = 64;
        let names: Vec<&str> = stores.iter().map(|s| s.name.as_str()).collect();
        println!("\n{}", "=".repeat(width).cyan());
        println!("{}", format!("  ESILV Assistant {}", version).bold().cyan());
        println!(
            "{}",
            format!("  Model: {} | Stores: {}", model, names.join(", ")).dimmed()
        );
        println!("{}\n", "=".repeat(width).cyan());
        println!(
            "Ask a question about ESILV (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner while the pipeline runs
    pub fn start_thinking(&mut self) {
        if !self.show_progress {
            return;
        }
        self.finish_thinking();
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message("The agent is searching the documents...");
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    pub fn finish_thinking(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn show_answer(&self, answer: &Answer, verbose: bool) {
        println!();
        println!("{} {}", format!("[{}]", answer.persona).magenta().bold(), answer.text);
        if answer.found {
            println!(
                "{}",
                format!(
                    "Search: {:.3}s • Generation: {:.3}s",
                    answer.retrieval_secs, answer.generation_secs
                )
                .dimmed()
            );
        }
        if verbose {
            println!("{}", format!("Routing: {:?}", answer.routing).dimmed());
            if answer.outcome != GuardrailOutcome::Accepted {
                println!("{}", format!("Guardrail: {:?}", answer.outcome).yellow());
            }
        }
        println!();
    }

    pub fn show_sources(&self, turn: &ConversationTurn) {
        if turn.sources.is_empty() {
            println!("{}", "No sources for the last answer.".yellow());
            return;
        }
        self.show_section("Sources");
        for line in format_sources(&turn.sources) {
            println!("{}", line);
        }
        println!();
    }

    pub fn show_history<'a>(&self, turns: impl Iterator<Item = &'a ConversationTurn>) {
        let turns: Vec<&ConversationTurn> = turns.collect();
        if turns.is_empty() {
            println!("{}", "No questions in history yet.".yellow());
            return;
        }
        self.show_section(&format!("History (last {})", turns.len()));
        for (i, turn) in turns.iter().enumerate() {
            let icon = if turn.found { "✓".green() } else { "✗".red() };
            println!(
                "  {}. {} [{}] {}",
                (i + 1).to_string().cyan(),
                icon,
                turn.agent,
                turn.question
            );
            println!("     {}", truncate_line(&turn.answer, 100).dimmed());
        }
        println!();
    }

    pub fn show_status(&self, stats: &TelemetryStats, turns: usize, uptime: Duration, verbose: bool) {
        self.show_section("Session Status");
        println!("  Questions:        {}", stats.questions.to_string().green());
        println!("  History Size:     {}", turns.to_string().green());
        println!("  Failures:         {}", stats.failures.to_string().green());
        println!("  Refusals:         {}", stats.refusals.to_string().green());
        for persona in Persona::ALL {
            println!(
                "  {:<17} {}",
                format!("{}:", persona),
                stats.routed_to(persona).to_string().green()
            );
        }
        println!("  Mean Retrieval:   {}", format!("{:.3}s", stats.mean_retrieval_secs()).green());
        println!("  Mean Generation:  {}", format!("{:.3}s", stats.mean_generation_secs()).green());
        println!("  Session Duration: {}", format_duration(uptime).green());
        println!("  Verbose Mode:     {}", if verbose { "On".green() } else { "Off".red() });
        println!();
    }

    pub fn show_stores(&self, stores: &[StoreSummary]) {
        self.show_section("Vector Stores");
        for store in stores {
            println!(
                "  {} {:<12} {} documents, {} vectors, d={}, {}",
                "•".cyan(),
                store.name.bold(),
                store.documents,
                store.vectors,
                store.dimension,
                store.metric
            );
        }
        println!();
    }

    pub fn show_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "→".cyan(), info);
    }

    pub fn show_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(60).cyan());
    }
}

/// `- title <url>` then the score and snippet, per source
pub fn format_sources(sources: &[SourceRef]) -> Vec<String> {
    sources
        .iter()
        .flat_map(|s| {
            let title = if s.title.is_empty() { s.url.as_str() } else { s.title.as_str() };
            [
                format!("  - {} <{}> [{}]", title.bold(), s.url, s.store),
                format!("    {}", format!("Score: {:.3} | {}", s.score, s.snippet).dimmed()),
            ]
        })
        .collect()
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn truncate_line(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
