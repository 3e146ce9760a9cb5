//! Vector stores
//!
//! A store is one named corpus partition: a nearest-neighbor index plus the
//! mapping from its integer ids to documents. Stores are loaded once at
//! startup and only read afterwards.

pub mod document;
pub mod index;

pub use document::{Document, Signature};
pub use index::{FlatIndex, Metric, NearestNeighborIndex, SearchResult};

use crate::errors::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Index artifact name inside a store directory
pub const INDEX_FILE: &str = "faiss_index.bin";

/// Mapping artifact name inside a store directory
pub const MAPPING_FILE: &str = "mapping.json";

/// Where to load a store from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSpec {
    pub name: String,
    pub path: PathBuf,
}

/// One loaded, independently searchable store
pub struct Store {
    name: String,
    index: Box<dyn NearestNeighborIndex>,
    mapping: HashMap<i64, Document>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("index", &self.index.kind())
            .field("vectors", &self.index.len())
            .field("documents", &self.mapping.len())
            .finish()
    }
}

impl Store {
    pub fn new(
        name: impl Into<String>,
        index: Box<dyn NearestNeighborIndex>,
        mapping: HashMap<i64, Document>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            mapping,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &dyn NearestNeighborIndex {
        self.index.as_ref()
    }

    /// `None` for ids the index knows but the mapping does not
    pub fn document(&self, id: i64) -> Option<&Document> {
        self.mapping.get(&id)
    }

    pub fn document_count(&self) -> usize {
        self.mapping.len()
    }
}

/// Load `faiss_index.bin` and `mapping.json` from `dir`.
///
/// Either both artifacts load or the call fails; there is no partial store.
pub fn load_store(name: &str, dir: &Path) -> Result<Store> {
    let index_path = dir.join(INDEX_FILE);
    let mapping_path = dir.join(MAPPING_FILE);

    if !index_path.exists() {
        return Err(AssistantError::MissingIndexFile(index_path));
    }
    if !mapping_path.exists() {
        return Err(AssistantError::MissingMappingFile(mapping_path));
    }

    let index = FlatIndex::read_faiss(&index_path)?;
    let mapping = read_mapping(&mapping_path)?;

    info!(
        store = name,
        dir = %dir.display(),
        index_type = index.kind(),
        metric = %index.metric(),
        dimension = index.dimension(),
        vectors = index.len(),
        mapping_size = mapping.len(),
        "Loaded store"
    );

    Ok(Store::new(name, Box::new(index), mapping))
}

/// Load every configured store, failing on the first error
pub fn load_stores(specs: &[StoreSpec]) -> Result<Vec<Store>> {
    specs
        .iter()
        .map(|spec| load_store(&spec.name, &spec.path))
        .collect()
}

/// Parse a JSON object of stringified integer ids to documents
pub fn read_mapping(path: &Path) -> Result<HashMap<i64, Document>> {
    let contents = std::fs::read_to_string(path)?;
    let raw: HashMap<String, Document> =
        serde_json::from_str(&contents).map_err(|e| AssistantError::InvalidMapping {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    raw.into_iter()
        .map(|(key, doc)| {
            key.trim()
                .parse::<i64>()
                .map(|id| (id, doc))
                .map_err(|_| AssistantError::InvalidMapping {
                    path: path.to_path_buf(),
                    reason: format!("key {:?} is not an integer id", key),
                })
        })
        .collect()
}
