//! Post-generation guardrail
//!
//! Rejects answers that are empty, describe a procedure the context never
//! mentions, or fail to cite any source the context offered.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Exact refusal sentence shared by the prompts and the guardrail
pub const REFUSAL: &str = "I do not have this information in the documents";

/// Step markers that make an answer look like a procedure
const STEP_MARKERS: &[&str] = &["1.", "2.", "step", "étape"];

/// Words showing the context actually talks about a procedure
const PROCEDURE_KEYWORDS: &[&str] = &[
    "apply",
    "application",
    "file",
    "review",
    "interview",
    "admission",
    "enrollment",
    "procedure",
    "modalities",
    "candidater",
    "candidature",
    "dossier",
    "entretien",
    "inscription",
    "modalités",
    "procédure",
];

const CITATION_PREFIXES: &[&str] = &["document://", "pdf://"];

/// Why an answer was kept or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailOutcome {
    Accepted,
    Empty,
    FabricatedProcedure,
    MissingCitation,
    /// Retrieval returned nothing to ground the answer on
    NoSources,
}

impl GuardrailOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GuardrailOutcome::Accepted)
    }
}

/// Final answer text plus the rule that decided it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub answer: String,
    pub outcome: GuardrailOutcome,
}

impl Verdict {
    fn refuse(outcome: GuardrailOutcome) -> Self {
        Self {
            answer: REFUSAL.to_string(),
            outcome,
        }
    }
}

/// Stateless; checks run in order and the first failing one wins
#[derive(Debug, Clone, Copy, Default)]
pub struct Guardrail;

impl Guardrail {
    pub fn new() -> Self {
        Self
    }

    pub fn finalize(&self, raw: &str, context: &str) -> Verdict {
        let answer = raw.trim();
        if answer.is_empty() {
            return Verdict::refuse(GuardrailOutcome::Empty);
        }

        if looks_procedural(answer) && !mentions_procedure(context) {
            return Verdict::refuse(GuardrailOutcome::FabricatedProcedure);
        }

        let citations = extract_citations(context);
        if !citations.is_empty() && !citations.iter().any(|c| answer.contains(c.as_str())) {
            return Verdict::refuse(GuardrailOutcome::MissingCitation);
        }

        Verdict {
            answer: raw.to_string(),
            outcome: GuardrailOutcome::Accepted,
        }
    }

    /// `finalize`, except that an answer built on zero hits is always refused
    pub fn finalize_retrieved(&self, raw: &str, context: &str, hit_count: usize) -> Verdict {
        if hit_count == 0 {
            return Verdict::refuse(GuardrailOutcome::NoSources);
        }
        self.finalize(raw, context)
    }

    pub fn finalize_text(&self, raw: &str, context: &str) -> String {
        self.finalize(raw, context).answer
    }
}

fn looks_procedural(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    STEP_MARKERS.iter().any(|m| lower.contains(m))
}

fn mentions_procedure(context: &str) -> bool {
    let lower = context.to_lowercase();
    PROCEDURE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Whitespace tokens of `context` that look like a source reference,
/// with surrounding punctuation stripped
pub fn extract_citations(context: &str) -> HashSet<String> {
    context
        .split_whitespace()
        .map(|token| token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']' | ',' | ':')))
        .filter(|token| {
            token.contains("http") || CITATION_PREFIXES.iter().any(|p| token.starts_with(p))
        })
        .map(str::to_string)
        .collect()
}
