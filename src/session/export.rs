//! History export to JSON and CSV

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::session::history::{ConversationTurn, History};

pub const CSV_HEADER: [&str; 7] = [
    "question",
    "answer",
    "agent",
    "found",
    "retrieval_time",
    "gen_time",
    "sources",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("Unknown export format '{}', expected json or csv", other),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Pretty JSON array of turns
pub fn to_json(history: &History) -> Result<String> {
    serde_json::to_string_pretty(history).context("Failed to serialize history")
}

pub fn to_csv(history: &History) -> String {
    let mut out = csv_row(CSV_HEADER.iter().map(|s| s.to_string()));
    for turn in history.turns() {
        out.push_str(&csv_row(turn_fields(turn)));
    }
    out
}

/// Write the history to `path` in `format`
pub fn export(history: &History, format: ExportFormat, path: &Path) -> Result<()> {
    let payload = match format {
        ExportFormat::Json => to_json(history)?,
        ExportFormat::Csv => to_csv(history),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, payload).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// `title<url>` for every source, joined with ` | `
pub fn sources_cell(turn: &ConversationTurn) -> String {
    turn.sources
        .iter()
        .map(|s| format!("{}<{}>", s.title, s.url))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn turn_fields(turn: &ConversationTurn) -> Vec<String> {
    vec![
        turn.question.clone(),
        turn.answer.clone(),
        turn.agent.clone(),
        if turn.found { "True" } else { "False" }.to_string(),
        turn.retrieval_time.to_string(),
        turn.gen_time.to_string(),
        sources_cell(turn),
    ]
}

/// One CRLF-terminated record, quoting only where needed
pub(crate) fn csv_row(fields: impl IntoIterator<Item = String>) -> String {
    let mut row = fields
        .into_iter()
        .map(|f| csv_field(&f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
