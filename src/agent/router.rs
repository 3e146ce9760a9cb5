//! Agent router
//!
//! Picks a persona for a question: lexical overrides first, then a vote over
//! the rubrics of the documents a quick retrieval returns.

use crate::agent::persona::{classify_rubric, Persona};
use crate::errors::Result;
use crate::rag::retrieval::{MultiStoreRetriever, SearchParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const WORK_STUDY_KEYWORDS: &[&str] = &["alternance", "apprentissage"];
const MOBILITY_KEYWORDS: &[&str] = &["international", "mobilité", "échange"];

/// How the persona was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingReason {
    /// Question mentions work-study
    WorkStudyKeyword,
    /// Question mentions mobility
    MobilityKeyword,
    /// Majority of retrieved rubrics, with the tally in first-seen order
    RubricVote { votes: Vec<(Persona, usize)> },
    /// Retrieval returned nothing
    NoHits,
    /// Retrieval failed; the default persona was used
    RetrievalFailed(String),
    /// Persona chosen by the caller
    Forced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub persona: Persona,
    pub reason: RoutingReason,
}

impl RoutingDecision {
    fn new(persona: Persona, reason: RoutingReason) -> Self {
        Self { persona, reason }
    }
}

pub struct AgentRouter {
    retriever: Arc<MultiStoreRetriever>,
    params: SearchParams,
}

impl AgentRouter {
    pub fn new(retriever: Arc<MultiStoreRetriever>) -> Self {
        Self::with_params(retriever, SearchParams::ROUTING)
    }

    pub fn with_params(retriever: Arc<MultiStoreRetriever>, params: SearchParams) -> Self {
        Self { retriever, params }
    }

    /// Never fails: a retrieval error degrades to Admissions
    pub async fn detect(&self, question: &str) -> RoutingDecision {
        if let Some(decision) = lexical_override(question) {
            debug!(persona = %decision.persona, "Routed by keyword");
            return decision;
        }

        match self.tally(question).await {
            Ok(votes) if votes.is_empty() => {
                RoutingDecision::new(Persona::Admissions, RoutingReason::NoHits)
            }
            Ok(votes) => {
                let persona = winner(&votes).unwrap_or(Persona::Admissions);
                debug!(persona = %persona, ?votes, "Routed by rubric vote");
                RoutingDecision::new(persona, RoutingReason::RubricVote { votes })
            }
            Err(e) => {
                warn!(error = %e, "Routing retrieval failed, defaulting to Admissions");
                RoutingDecision::new(Persona::Admissions, RoutingReason::RetrievalFailed(e.to_string()))
            }
        }
    }

    /// Rubric vote alone. `Ok(None)` when retrieval finds nothing.
    pub async fn vote(&self, question: &str) -> Result<Option<Persona>> {
        let votes = self.tally(question).await?;
        Ok(winner(&votes))
    }

    async fn tally(&self, question: &str) -> Result<Vec<(Persona, usize)>> {
        let hits = self.retriever.search_with(question, self.params).await?;

        let mut votes: Vec<(Persona, usize)> = Vec::new();
        for hit in &hits {
            let persona = classify_rubric(&hit.document.rubric);
            match votes.iter_mut().find(|(p, _)| *p == persona) {
                Some((_, count)) => *count += 1,
                None => votes.push((persona, 1)),
            }
        }
        Ok(votes)
    }

    pub fn params(&self) -> SearchParams {
        self.params
    }
}

/// Lexical rules checked before any retrieval
pub fn lexical_override(question: &str) -> Option<RoutingDecision> {
    let q = question.to_lowercase();
    if WORK_STUDY_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Some(RoutingDecision::new(Persona::Admissions, RoutingReason::WorkStudyKeyword));
    }
    if MOBILITY_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Some(RoutingDecision::new(Persona::International, RoutingReason::MobilityKeyword));
    }
    None
}

/// Highest count; ties go to the persona seen first
fn winner(votes: &[(Persona, usize)]) -> Option<Persona> {
    let mut best: Option<(Persona, usize)> = None;
    for &(persona, count) in votes {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((persona, count));
        }
    }
    best.map(|(p, _)| p)
}
