//! Domain personas and the rubric keyword table

use crate::errors::{AssistantError, Result};
use crate::rag::guardrail::REFUSAL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prompt persona chosen per question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    Admissions,
    Formations,
    International,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Admissions, Persona::Formations, Persona::International];

    pub fn name(&self) -> &'static str {
        match self {
            Persona::Admissions => "Admissions",
            Persona::Formations => "Formations",
            Persona::International => "International",
        }
    }

    /// Static system-level directive sent with every generation request
    pub fn system_prompt(&self) -> String {
        let body = match self {
            Persona::Admissions => {
                "You are the official ESILV admissions expert.\n\
                 You answer only from the provided context.\n\
                 Style: clear, short, structured, always give the source."
            }
            Persona::Formations => {
                "You are an ESILV academic advisor.\n\
                 You answer only with the provided context.\n\
                 If a programme does not appear in the context, say so."
            }
            Persona::International => {
                "You are the ESILV international mobility expert.\n\
                 You never invent anything."
            }
        };
        format!(
            "{}\nIf the information is not in the documents, reply exactly: \"{}\"",
            body, REFUSAL
        )
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Persona {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admissions" | "admission" => Ok(Persona::Admissions),
            "formations" | "formation" => Ok(Persona::Formations),
            "international" => Ok(Persona::International),
            other => Err(AssistantError::Config(format!("unknown persona: {}", other))),
        }
    }
}

/// Map a document rubric to a persona.
///
/// Unknown and empty rubrics fall into Admissions, which biases the vote
/// toward that persona when the corpus metadata is sparse.
pub fn classify_rubric(rubric: &str) -> Persona {
    let rubric = rubric.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| rubric.contains(w));

    if has(&["admission", "concour"]) {
        Persona::Admissions
    } else if has(&["formation", "programme", "cursus"]) {
        Persona::Formations
    } else if has(&["international", "échange", "mobilité"]) {
        Persona::International
    } else {
        Persona::Admissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rubric_table() {
        assert_eq!(classify_rubric("Admissions"), Persona::Admissions);
        assert_eq!(classify_rubric("concours-avenir"), Persona::Admissions);
        assert_eq!(classify_rubric("Programme Grande École"), Persona::Formations);
        assert_eq!(classify_rubric("cursus"), Persona::Formations);
        assert_eq!(classify_rubric("Mobilité"), Persona::International);
        assert_eq!(classify_rubric("échanges"), Persona::International);
    }

    #[test]
    fn test_classify_rubric_defaults_to_admissions() {
        assert_eq!(classify_rubric(""), Persona::Admissions);
        assert_eq!(classify_rubric("vie associative"), Persona::Admissions);
    }

    #[test]
    fn test_admission_wins_over_later_buckets() {
        assert_eq!(classify_rubric("admission internationale"), Persona::Admissions);
    }

    #[test]
    fn test_prompts_carry_refusal() {
        for persona in Persona::ALL {
            let prompt = persona.system_prompt();
            assert!(prompt.contains("ESILV"));
            assert!(prompt.contains(REFUSAL));
        }
    }

    #[test]
    fn test_parse_and_display() {
        for persona in Persona::ALL {
            assert_eq!(persona.to_string().parse::<Persona>().unwrap(), persona);
        }
        assert!("finance".parse::<Persona>().is_err());
    }
}
