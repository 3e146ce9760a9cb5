//! Question embedding
//!
//! Wraps the embedding service and L2-normalizes its output so inner-product
//! search behaves like cosine similarity.

use crate::errors::{AssistantError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Added to the norm so an all-zero vector does not divide by zero
pub const NORM_EPSILON: f32 = 1e-12;

/// Embedding service seam
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Raw, unnormalized embedding for `text`
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Normalizing embedder shared by retrieval and routing
#[derive(Clone)]
pub struct Embedder {
    backend: Arc<dyn EmbeddingBackend>,
    expected_dimension: Option<usize>,
}

impl Embedder {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            expected_dimension: None,
        }
    }

    /// Reject vectors whose length differs from `dimension`
    pub fn with_dimension(backend: Arc<dyn EmbeddingBackend>, dimension: usize) -> Self {
        Self {
            backend,
            expected_dimension: Some(dimension),
        }
    }

    /// Embed once and normalize to unit length. Not cached.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = self.backend.embed(text).await.map_err(|e| match e {
            AssistantError::EmbeddingService(_) => e,
            other => AssistantError::EmbeddingService(other.to_string()),
        })?;

        if vector.is_empty() {
            return Err(AssistantError::EmbeddingService(format!(
                "model {} returned an empty vector",
                self.backend.model_name()
            )));
        }
        if let Some(expected) = self.expected_dimension {
            if vector.len() != expected {
                return Err(AssistantError::EmbeddingService(format!(
                    "expected {} dimensions, got {}",
                    expected,
                    vector.len()
                )));
            }
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(AssistantError::EmbeddingService(
                "embedding contains non-finite values".to_string(),
            ));
        }

        normalize(&mut vector);
        Ok(vector)
    }

    pub fn expected_dimension(&self) -> Option<usize> {
        self.expected_dimension
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

/// In-place `v / (|v| + eps)`
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm + NORM_EPSILON;
    for x in vector.iter_mut() {
        *x /= denom;
    }
}
