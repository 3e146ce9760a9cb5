//! Doctor command for setup diagnostics
//!
//! Checks that Ollama answers, that both models are installed, and that every
//! configured store loads.

use colored::*;

use crate::ollama::OllamaClient;
use crate::store::{load_store, StoreSpec};

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

pub struct Doctor {
    client: OllamaClient,
    stores: Vec<StoreSpec>,
    dimension: Option<usize>,
}

impl Doctor {
    pub fn new(client: OllamaClient, stores: Vec<StoreSpec>, dimension: Option<usize>) -> Self {
        Self {
            client,
            stores,
            dimension,
        }
    }

    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = vec![self.check_ollama_api().await];
        checks.extend(self.check_models().await);
        checks.extend(self.stores.iter().map(|spec| self.check_store(spec)));
        checks
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        let name = "Ollama API";
        match self.client.health_check().await {
            Ok(true) => HealthCheck::new(name, HealthStatus::Pass),
            Ok(false) => HealthCheck::new(
                name,
                HealthStatus::Fail(format!(
                    "Ollama not reachable at {}",
                    self.client.base_url()
                )),
            ),
            Err(e) => HealthCheck::new(name, HealthStatus::Fail(format!("Error checking Ollama: {}", e))),
        }
    }

    async fn check_models(&self) -> Vec<HealthCheck> {
        let wanted = [
            ("Embedding Model", self.client.embedding_model()),
            ("Chat Model", self.client.chat_model()),
        ];

        let installed = match self.client.list_models().await {
            Ok(models) => models,
            Err(e) => {
                return wanted
                    .iter()
                    .map(|(name, _)| {
                        HealthCheck::new(*name, HealthStatus::Fail(format!("Cannot list models: {}", e)))
                    })
                    .collect();
            }
        };

        wanted
            .iter()
            .map(|(name, model)| {
                let status = if model_installed(&installed, model) {
                    HealthStatus::Pass
                } else {
                    HealthStatus::Fail(format!("{} is not installed (ollama pull {})", model, model))
                };
                HealthCheck::new(*name, status)
            })
            .collect()
    }

    fn check_store(&self, spec: &StoreSpec) -> HealthCheck {
        let name = format!("Store {}", spec.name);
        let store = match load_store(&spec.name, &spec.path) {
            Ok(store) => store,
            Err(e) => return HealthCheck::new(name, HealthStatus::Fail(e.to_string())),
        };

        let index = store.index();
        let status = match self.dimension {
            Some(expected) if expected != index.dimension() => HealthStatus::Fail(format!(
                "index dimension {} but the embedding model produces {}",
                index.dimension(),
                expected
            )),
            _ if index.is_empty() || store.document_count() == 0 => {
                HealthStatus::Warn("store is empty".to_string())
            }
            _ if index.len() != store.document_count() => HealthStatus::Warn(format!(
                "{} vectors but {} mapped documents",
                index.len(),
                store.document_count()
            )),
            _ => HealthStatus::Pass,
        };
        HealthCheck::new(name, status)
    }

    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "ESILV Assistant Diagnostics".bold().cyan());
        println!("{:<24} Status", "Check");
        println!("{}", "=".repeat(60));

        for check in checks {
            let message = match &check.status {
                HealthStatus::Pass => "PASS".green(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red(),
            };
            println!("{:<24} {}", check.name, message);
        }

        println!();
    }

    /// No check failed; warnings are allowed
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// Ollama lists untagged pulls as `name:latest`
pub fn model_installed(installed: &[String], wanted: &str) -> bool {
    installed.iter().any(|m| {
        m == wanted
            || (!wanted.contains(':') && m.strip_suffix(":latest") == Some(wanted))
    })
}
