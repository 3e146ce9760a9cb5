//! Telemetry for the question pipeline
//!
//! Collects per-question events and keeps running counters for `/status`.

use crate::agent::Persona;
use crate::rag::guardrail::GuardrailOutcome;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pipeline event types
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    AgentRouted {
        persona: Persona,
        timestamp: Instant,
    },
    RetrievalCompleted {
        hits: usize,
        duration: Duration,
        timestamp: Instant,
    },
    GenerationCompleted {
        duration: Duration,
        timestamp: Instant,
    },
    GuardrailTriggered {
        outcome: GuardrailOutcome,
        timestamp: Instant,
    },
    QuestionFailed {
        error: String,
        timestamp: Instant,
    },
}

/// Running counters
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub questions: usize,
    pub failures: usize,
    pub refusals: usize,
    pub admissions_routed: usize,
    pub formations_routed: usize,
    pub international_routed: usize,
    pub retrievals: usize,
    pub total_hits: usize,
    pub retrieval_time: Duration,
    pub generation_time: Duration,
    pub generations: usize,
}

impl TelemetryStats {
    pub fn routed_to(&self, persona: Persona) -> usize {
        match persona {
            Persona::Admissions => self.admissions_routed,
            Persona::Formations => self.formations_routed,
            Persona::International => self.international_routed,
        }
    }

    pub fn mean_retrieval_secs(&self) -> f64 {
        mean_secs(self.retrieval_time, self.retrievals.max(1))
    }

    pub fn mean_generation_secs(&self) -> f64 {
        mean_secs(self.generation_time, self.generations.max(1))
    }
}

fn mean_secs(total: Duration, n: usize) -> f64 {
    total.as_secs_f64() / n as f64
}

/// Telemetry collector, cheap to clone
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

// Recovers from poisoning
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: PipelineEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                PipelineEvent::AgentRouted { persona, .. } => {
                    stats.questions += 1;
                    match persona {
                        Persona::Admissions => stats.admissions_routed += 1,
                        Persona::Formations => stats.formations_routed += 1,
                        Persona::International => stats.international_routed += 1,
                    }
                }
                PipelineEvent::RetrievalCompleted { hits, duration, .. } => {
                    stats.retrievals += 1;
                    stats.total_hits += hits;
                    stats.retrieval_time += *duration;
                }
                PipelineEvent::GenerationCompleted { duration, .. } => {
                    stats.generations += 1;
                    stats.generation_time += *duration;
                }
                PipelineEvent::GuardrailTriggered { outcome, .. } => {
                    if !outcome.is_accepted() {
                        stats.refusals += 1;
                    }
                }
                PipelineEvent::QuestionFailed { .. } => {
                    stats.failures += 1;
                }
            }
        }

        lock(&self.events).push(event);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Last `n` events, oldest first
    pub fn recent_events(&self, n: usize) -> Vec<PipelineEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Share of questions whose answer passed the guardrail
    pub fn grounded_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let answered = stats.generations;
        if answered == 0 {
            1.0
        } else {
            answered.saturating_sub(stats.refusals) as f64 / answered as f64
        }
    }

    /// Forget everything but the start time
    pub fn reset(&self) {
        *lock(&self.stats) = TelemetryStats::default();
        lock(&self.events).clear();
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
