//! Contact capture: validated requests appended to a CSV file

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::errors::AssistantError;
use crate::session::export::csv_row;

pub const CONTACTS_HEADER: [&str; 6] = [
    "first_name",
    "last_name",
    "email",
    "consent",
    "timestamp",
    "source",
];

/// Value written to the `source` column
pub const CONTACT_SOURCE: &str = "assistant_repl";

/// Confirmation shown and stored in history after registration
pub const CONFIRMATION: &str = "Your contact details have been recorded for follow-up by ESILV.";

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub consent: bool,
}

impl ContactRequest {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        consent: bool,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            consent,
        }
    }

    /// Every failed rule, not just the first
    pub fn validate(&self) -> Result<(), AssistantError> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push("Please enter your first name.".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("Please enter your last name.".to_string());
        }
        if !is_valid_email(self.email.trim()) {
            errors.push("Please enter a valid email address.".to_string());
        }
        if !self.consent {
            errors.push("You must agree to be contacted before your details can be recorded.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AssistantError::InvalidContact(errors))
        }
    }
}

/// Append-only CSV of contact requests
#[derive(Debug, Clone)]
pub struct ContactBook {
    path: PathBuf,
}

impl ContactBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate, then append one row; the header is written with the first row
    pub fn append(&self, request: &ContactRequest) -> Result<()> {
        request.validate()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let write_header = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut payload = String::new();
        if write_header {
            payload.push_str(&csv_row(CONTACTS_HEADER.iter().map(|s| s.to_string())));
        }
        payload.push_str(&csv_row([
            request.first_name.trim().to_string(),
            request.last_name.trim().to_string(),
            request.email.trim().to_string(),
            "True".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            CONTACT_SOURCE.to_string(),
        ]));

        file.write_all(payload.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_collects_every_error() {
        let request = ContactRequest::new(" ", "", "not-an-email", false);
        match request.validate() {
            Err(AssistantError::InvalidContact(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected InvalidContact, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_trimmed_email() {
        let request = ContactRequest::new("Léa", "Martin", "  lea.martin@example.fr ", true);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let book = ContactBook::new(dir.path().join("contacts").join("contacts.csv"));

        book.append(&ContactRequest::new("Léa", "Martin", "lea@example.fr", true)).unwrap();
        book.append(&ContactRequest::new("Hugo", "Durand", "hugo@example.fr", true)).unwrap();

        let written = std::fs::read_to_string(book.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "first_name,last_name,email,consent,timestamp,source");
        assert!(lines[1].starts_with("Léa,Martin,lea@example.fr,True,"));
        assert!(lines[2].ends_with(",assistant_repl"));
    }

    #[test]
    fn test_append_rejects_invalid_request() {
        let dir = TempDir::new().unwrap();
        let book = ContactBook::new(dir.path().join("contacts.csv"));
        assert!(book.append(&ContactRequest::new("Léa", "Martin", "lea@", true)).is_err());
        assert!(!book.path().exists());
    }
}
