//! Multi-store retrieval engine

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::Result;
use crate::rag::retrieval::rank_hits;
use crate::store::{Document, Store};

/// Per-store and global caps for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Neighbors requested from each store
    pub per_store_k: usize,
    /// Unique hits kept after merging
    pub total_k: usize,
}

impl SearchParams {
    /// Answer retrieval defaults
    pub const ANSWER: SearchParams = SearchParams {
        per_store_k: 8,
        total_k: 10,
    };

    /// Agent routing vote defaults
    pub const ROUTING: SearchParams = SearchParams {
        per_store_k: 4,
        total_k: 8,
    };
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::ANSWER
    }
}

/// One retrieved document with its originating store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub score: f32,
    pub id: i64,
    pub store: String,
    pub document: Document,
}

/// Fans a question out to every registered store and merges the results.
///
/// Stores are injected at construction and never mutated, so one retriever
/// can be shared between the answer path and the agent router.
pub struct MultiStoreRetriever {
    embedder: Embedder,
    stores: Vec<Store>,
}

impl MultiStoreRetriever {
    pub fn new(embedder: Embedder, stores: Vec<Store>) -> Self {
        Self { embedder, stores }
    }

    pub fn shared(embedder: Embedder, stores: Vec<Store>) -> Arc<Self> {
        Arc::new(Self::new(embedder, stores))
    }

    /// Embed `question` once and search every store with the same vector
    pub async fn search(&self, question: &str, per_store_k: usize, total_k: usize) -> Result<Vec<Hit>> {
        let vector = self.embedder.embed(question).await?;
        self.search_vector(&vector, per_store_k, total_k)
    }

    pub async fn search_with(&self, question: &str, params: SearchParams) -> Result<Vec<Hit>> {
        self.search(question, params.per_store_k, params.total_k).await
    }

    /// Search with an already embedded query.
    ///
    /// Scores from different stores are compared as-is: all stores must use
    /// the same "higher is more similar" convention for the ranking to mean
    /// anything.
    pub fn search_vector(&self, vector: &[f32], per_store_k: usize, total_k: usize) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();

        for store in &self.stores {
            let result = store.index().search(vector, per_store_k)?;
            for (score, id) in result.iter() {
                if id < 0 || score.is_nan() {
                    continue;
                }
                match store.document(id) {
                    Some(document) => hits.push(Hit {
                        score,
                        id,
                        store: store.name().to_string(),
                        document: document.clone(),
                    }),
                    None => debug!(store = store.name(), id, "Index id missing from mapping, skipped"),
                }
            }
        }

        let ranked = rank_hits(hits, total_k);
        for hit in &ranked {
            debug!(
                score = %format!("{:.4}", hit.score),
                store = %hit.store,
                rubric = %hit.document.rubric,
                title = %hit.document.title,
                url = %hit.document.url,
                "retrieved"
            );
        }
        Ok(ranked)
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.name()).collect()
    }

    pub fn document_count(&self) -> usize {
        self.stores.iter().map(|s| s.document_count()).sum()
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingBackend;
    use crate::errors::AssistantError;
    use crate::store::{FlatIndex, Metric};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingBackend for CountingBackend {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn store(name: &str, rows: &[Vec<f32>], docs: &[(i64, Document)]) -> Store {
        let index = FlatIndex::from_rows(Metric::InnerProduct, rows).unwrap();
        let mapping: HashMap<i64, Document> = docs.iter().cloned().collect();
        Store::new(name, Box::new(index), mapping)
    }

    fn doc(content: &str, url: &str) -> Document {
        Document::new(content, url, "", "admissions")
    }

    #[test]
    fn test_search_vector_merges_stores() {
        let site = store(
            "v2_site",
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            &[(0, doc("Concours", "https://esilv.fr/a")), (1, doc("Majeures", "https://esilv.fr/b"))],
        );
        let pdf = store(
            "v3_pdf",
            &[vec![0.9, 0.1]],
            &[(0, doc("Brochure admissions", "document://brochure.pdf"))],
        );
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            vector: vec![1.0, 0.0],
        });
        let retriever = MultiStoreRetriever::new(Embedder::new(backend), vec![site, pdf]);

        let hits = retriever.search_vector(&[1.0, 0.0], 2, 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].store, "v2_site");
        assert_eq!(hits[1].store, "v3_pdf");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_unmapped_ids_are_skipped() {
        let partial = store(
            "v2_site",
            &[vec![1.0], vec![0.5]],
            &[(1, doc("only mapped entry", "https://esilv.fr/x"))],
        );
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            vector: vec![1.0],
        });
        let retriever = MultiStoreRetriever::new(Embedder::new(backend), vec![partial]);
        let hits = retriever.search_vector(&[1.0], 5, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[tokio::test]
    async fn test_question_embedded_once_for_all_stores() {
        let a = store("a", &[vec![1.0, 0.0]], &[(0, doc("a", "u1"))]);
        let b = store("b", &[vec![0.0, 1.0]], &[(0, doc("b", "u2"))]);
        let c = store("c", &[vec![0.5, 0.5]], &[(0, doc("c", "u3"))]);
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            vector: vec![1.0, 0.0],
        });
        let retriever = MultiStoreRetriever::new(Embedder::new(backend.clone()), vec![a, b, c]);

        let hits = retriever.search("Quelles majeures ?", 1, 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let a = store("a", &[vec![1.0, 0.0]], &[(0, doc("a", "u1"))]);
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            vector: vec![1.0],
        });
        let retriever = MultiStoreRetriever::new(Embedder::new(backend), vec![a]);
        assert!(matches!(
            retriever.search_vector(&[1.0], 1, 1),
            Err(AssistantError::IndexSearch(_))
        ));
    }

    #[test]
    fn test_search_params_defaults() {
        assert_eq!(SearchParams::default(), SearchParams::ANSWER);
        assert_eq!(SearchParams::ROUTING.per_store_k, 4);
        assert_eq!(SearchParams::ROUTING.total_k, 8);
    }
}
