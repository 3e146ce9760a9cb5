//! End-to-end question pipeline: route, retrieve, build context, generate, verify

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::{AgentRouter, Persona, RoutingDecision, RoutingReason};
use crate::errors::Result;
use crate::rag::context::{ContextBuilder, ContextConfig};
use crate::rag::generator::{GenerationTransport, Generator, LanguageModel};
use crate::rag::guardrail::{Guardrail, GuardrailOutcome, REFUSAL};
use crate::rag::retrieval::{Hit, MultiStoreRetriever, SearchParams};
use crate::telemetry::{PipelineEvent, TelemetryCollector};

/// Phrases that mean the model did not find the answer
const NOT_FOUND_MARKERS: &[&str] = &[
    "je ne sais pas",
    "je n'ai pas cette information",
    "i don't know",
];

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retrieval caps for answering
    pub retrieval: SearchParams,
    /// Retrieval caps for the routing vote
    pub routing: SearchParams,
    /// Context assembly
    pub context: ContextConfig,
    /// Generation call shape
    pub transport: GenerationTransport,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval: SearchParams::ANSWER,
            routing: SearchParams::ROUTING,
            context: ContextConfig::default(),
            transport: GenerationTransport::default(),
        }
    }
}

/// Everything one question produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    /// Final text after the guardrail
    pub text: String,
    pub persona: Persona,
    pub routing: RoutingReason,
    pub hits: Vec<Hit>,
    pub context: String,
    pub retrieval_secs: f64,
    pub generation_secs: f64,
    pub outcome: GuardrailOutcome,
    pub found: bool,
}

/// The assembled assistant. Built once, queried many times.
pub struct Assistant {
    retriever: Arc<MultiStoreRetriever>,
    router: AgentRouter,
    context_builder: ContextBuilder,
    generator: Generator,
    guardrail: Guardrail,
    config: PipelineConfig,
    telemetry: TelemetryCollector,
}

impl Assistant {
    pub fn new(retriever: Arc<MultiStoreRetriever>, model: Arc<dyn LanguageModel>) -> Self {
        Self::with_config(retriever, model, PipelineConfig::default())
    }

    pub fn with_config(
        retriever: Arc<MultiStoreRetriever>,
        model: Arc<dyn LanguageModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            router: AgentRouter::with_params(retriever.clone(), config.routing),
            retriever,
            context_builder: ContextBuilder::with_config(config.context),
            generator: Generator::new(model, config.transport),
            guardrail: Guardrail::new(),
            config,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Share an existing collector instead of the private one
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Answer `question` with the routed persona.
    ///
    /// Routing never fails; retrieval and generation errors are returned for
    /// this question only.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let routing = self.router.detect(question).await;
        self.answer_recorded(question, routing).await
    }

    /// Answer with a fixed persona, skipping the router
    pub async fn ask_as(&self, question: &str, persona: Persona) -> Result<Answer> {
        let routing = RoutingDecision {
            persona,
            reason: RoutingReason::Forced,
        };
        self.answer_recorded(question, routing).await
    }

    async fn answer_recorded(&self, question: &str, routing: RoutingDecision) -> Result<Answer> {
        self.telemetry.record(PipelineEvent::AgentRouted {
            persona: routing.persona,
            timestamp: Instant::now(),
        });

        let result = self.answer(question, routing).await;
        if let Err(e) = &result {
            warn!(error = %e, "Question failed");
            self.telemetry.record(PipelineEvent::QuestionFailed {
                error: e.to_string(),
                timestamp: Instant::now(),
            });
        }
        result
    }

    async fn answer(&self, question: &str, routing: RoutingDecision) -> Result<Answer> {
        info!(persona = %routing.persona, "Answering question");

        let started = Instant::now();
        let hits = self.retriever.search_with(question, self.config.retrieval).await?;
        let retrieval_time = started.elapsed();
        self.telemetry.record(PipelineEvent::RetrievalCompleted {
            hits: hits.len(),
            duration: retrieval_time,
            timestamp: Instant::now(),
        });

        let context = self.context_builder.build(&hits);
        debug!(chars = context.chars().count(), hits = hits.len(), "Context built");

        let started = Instant::now();
        let raw = self
            .generator
            .generate(&context, question, &routing.persona.system_prompt())
            .await?;
        let generation_time = started.elapsed();
        self.telemetry.record(PipelineEvent::GenerationCompleted {
            duration: generation_time,
            timestamp: Instant::now(),
        });

        let verdict = self.guardrail.finalize_retrieved(&raw, &context, hits.len());
        self.telemetry.record(PipelineEvent::GuardrailTriggered {
            outcome: verdict.outcome,
            timestamp: Instant::now(),
        });
        if !verdict.outcome.is_accepted() {
            info!(outcome = ?verdict.outcome, "Answer replaced by refusal");
        }

        let found = is_found(&verdict.answer, verdict.outcome, hits.len());
        Ok(Answer {
            question: question.to_string(),
            text: verdict.answer,
            persona: routing.persona,
            routing: routing.reason,
            hits,
            context,
            retrieval_secs: retrieval_time.as_secs_f64(),
            generation_secs: generation_time.as_secs_f64(),
            outcome: verdict.outcome,
            found,
        })
    }

    pub fn retriever(&self) -> &Arc<MultiStoreRetriever> {
        &self.retriever
    }

    pub fn router(&self) -> &AgentRouter {
        &self.router
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}

/// Accepted, backed by sources, and not an admission of ignorance
pub fn is_found(text: &str, outcome: GuardrailOutcome, hit_count: usize) -> bool {
    if !outcome.is_accepted() || hit_count == 0 {
        return false;
    }
    let lower = text.to_lowercase();
    !NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) && !lower.contains(&REFUSAL.to_lowercase())
}
