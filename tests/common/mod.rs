//! Shared fixtures: on-disk stores and in-process model fakes

#![allow(dead_code)]

use async_trait::async_trait;
use esilv_assistant::embedding::EmbeddingBackend;
use esilv_assistant::errors::{AssistantError, Result};
use esilv_assistant::rag::{ChatMessage, LanguageModel};
use esilv_assistant::store::Document;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

pub const METRIC_INNER_PRODUCT: i32 = 0;
pub const METRIC_L2: i32 = 1;

/// Bytes of a FAISS `IndexFlatIP`/`IndexFlatL2` as `faiss.write_index` lays them out
pub fn faiss_flat_bytes(metric: i32, dimension: usize, rows: &[Vec<f32>]) -> Vec<u8> {
    let fourcc: &[u8; 4] = if metric == METRIC_INNER_PRODUCT { b"IxFI" } else { b"IxF2" };
    let ntotal = rows.len() as i64;
    let mut out = Vec::new();
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(dimension as i32).to_le_bytes());
    out.extend_from_slice(&ntotal.to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.push(1);
    out.extend_from_slice(&metric.to_le_bytes());
    out.extend_from_slice(&((rows.len() * dimension) as u64).to_le_bytes());
    for value in rows.iter().flatten() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Write `faiss_index.bin` and `mapping.json` into `dir`
pub fn write_store(dir: &Path, dimension: usize, rows: &[Vec<f32>], docs: &[(i64, Document)]) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("faiss_index.bin"),
        faiss_flat_bytes(METRIC_INNER_PRODUCT, dimension, rows),
    )
    .unwrap();

    let mapping: BTreeMap<String, &Document> =
        docs.iter().map(|(id, doc)| (id.to_string(), doc)).collect();
    std::fs::write(
        dir.join("mapping.json"),
        serde_json::to_string_pretty(&mapping).unwrap(),
    )
    .unwrap();
}

/// Embeds by topic keyword onto three axes: applying, programs, everything else
pub struct TopicEmbedder;

#[async_trait]
impl EmbeddingBackend for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let vector = if text.contains("apply") || text.contains("admission") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("program") || text.contains("course") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        };
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "topic"
    }
}

pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingBackend for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(AssistantError::OllamaApi("connection refused".to_string()))
    }

    fn model_name(&self) -> &str {
        "unreachable"
    }
}

/// Replies with a fixed text and remembers what it was sent
pub struct ScriptedModel {
    reply: String,
    pub chats: Mutex<Vec<Vec<ChatMessage>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            chats: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.chats.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
