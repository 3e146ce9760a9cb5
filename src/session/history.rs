//! Conversation history kept for the lifetime of a REPL session

use serde::{Deserialize, Serialize};

use crate::agent::Persona;
use crate::rag::context::snippet;
use crate::rag::pipeline::Answer;

/// Characters of each source shown to the user
pub const DEFAULT_DISPLAY_CHARS: usize = 200;

/// A retrieved source as shown and exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub store: String,
    pub rubric: String,
    pub score: f32,
    pub snippet: String,
}

/// User rating of one answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub useful: Option<bool>,
    pub comment: Option<String>,
}

/// One question and what came back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub agent: String,
    pub sources: Vec<SourceRef>,
    /// Seconds, rounded to milliseconds
    pub retrieval_time: f64,
    pub gen_time: f64,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl ConversationTurn {
    pub fn from_answer(answer: &Answer, display_chars: usize) -> Self {
        let sources = answer
            .hits
            .iter()
            .map(|hit| SourceRef {
                title: hit.document.title.clone(),
                url: hit.document.url.clone(),
                store: hit.store.clone(),
                rubric: hit.document.rubric.clone(),
                score: hit.score,
                snippet: snippet(&hit.document.content, display_chars),
            })
            .collect();

        Self {
            question: answer.question.clone(),
            answer: answer.text.clone(),
            agent: answer.persona.name().to_string(),
            sources,
            retrieval_time: round_ms(answer.retrieval_secs),
            gen_time: round_ms(answer.generation_secs),
            found: answer.found,
            feedback: None,
        }
    }

    /// A turn that did not go through the pipeline
    pub fn note(question: impl Into<String>, answer: impl Into<String>, persona: Persona) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            agent: persona.name().to_string(),
            sources: Vec::new(),
            retrieval_time: 0.0,
            gen_time: 0.0,
            found: false,
            feedback: None,
        }
    }
}

fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Ordered turns, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn latest(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// At most `n` turns, newest first
    pub fn newest_first(&self, n: usize) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().rev().take(n)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Rate the latest turn. Returns `false` when there is nothing to rate.
    pub fn record_feedback(&mut self, useful: bool, comment: Option<String>) -> bool {
        match self.turns.last_mut() {
            Some(turn) => {
                let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
                turn.feedback = Some(Feedback {
                    useful: Some(useful),
                    comment,
                });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RoutingReason;
    use crate::rag::guardrail::GuardrailOutcome;
    use crate::rag::retrieval::Hit;
    use crate::store::Document;

    fn answer() -> Answer {
        Answer {
            question: "Quels concours ?".to_string(),
            text: "Concours Avenir (https://esilv.fr/admissions)".to_string(),
            persona: Persona::Admissions,
            routing: RoutingReason::NoHits,
            hits: vec![Hit {
                score: 0.8123,
                id: 3,
                store: "v2_site".to_string(),
                document: Document::new(
                    "Le concours\nAvenir regroupe plusieurs écoles",
                    "https://esilv.fr/admissions",
                    "Admissions",
                    "admissions",
                ),
            }],
            context: String::new(),
            retrieval_secs: 0.123456,
            generation_secs: 2.0004,
            outcome: GuardrailOutcome::Accepted,
            found: true,
        }
    }

    #[test]
    fn test_turn_from_answer() {
        let turn = ConversationTurn::from_answer(&answer(), 11);
        assert_eq!(turn.agent, "Admissions");
        assert_eq!(turn.retrieval_time, 0.123);
        assert_eq!(turn.gen_time, 2.0);
        assert_eq!(turn.sources.len(), 1);
        assert_eq!(turn.sources[0].snippet, "Le concours");
        assert!(turn.found);
    }

    #[test]
    fn test_newest_first_and_reset() {
        let mut history = History::new();
        history.push(ConversationTurn::note("q1", "a1", Persona::Admissions));
        history.push(ConversationTurn::note("q2", "a2", Persona::Formations));
        history.push(ConversationTurn::note("q3", "a3", Persona::International));

        let listed: Vec<&str> = history.newest_first(2).map(|t| t.question.as_str()).collect();
        assert_eq!(listed, vec!["q3", "q2"]);

        history.reset();
        assert!(history.is_empty());
    }

    #[test]
    fn test_feedback_on_latest_turn() {
        let mut history = History::new();
        assert!(!history.record_feedback(true, None));

        history.push(ConversationTurn::from_answer(&answer(), DEFAULT_DISPLAY_CHARS));
        assert!(history.record_feedback(false, Some("  trop vague ".to_string())));

        let feedback = history.latest().and_then(|t| t.feedback.clone()).unwrap();
        assert_eq!(feedback.useful, Some(false));
        assert_eq!(feedback.comment.as_deref(), Some("trop vague"));
    }
}
