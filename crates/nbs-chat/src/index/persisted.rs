//! Read-only loader for a persisted vector index
//!
//! Layout of the persist directory:
//!
//! ```text
//! store/
//!   docstore.json               {"docstore/data": {node_id: {"__data__": {"text", "metadata"}}}}
//!   default__vector_store.json  {"embedding_dict": {node_id: [f32, ...]}}
//! ```
//!
//! The index is never written or rebuilt by this crate.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// File holding node texts and metadata
pub const DOCSTORE_FILE: &str = "docstore.json";

/// File holding node embeddings
pub const VECTOR_STORE_FILE: &str = "default__vector_store.json";

/// One retrievable node of the index
#[derive(Debug, Clone)]
pub struct IndexNode {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// A node with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredNode {
    pub node: IndexNode,
    pub score: f32,
}

#[derive(Deserialize)]
struct DocStoreFile {
    #[serde(rename = "docstore/data", default)]
    data: HashMap<String, DocStoreEntry>,
}

#[derive(Deserialize)]
struct DocStoreEntry {
    #[serde(rename = "__data__")]
    data: NodeData,
}

#[derive(Deserialize)]
struct NodeData {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct VectorStoreFile {
    #[serde(default)]
    embedding_dict: HashMap<String, Vec<f32>>,
}

/// In-memory copy of the persisted index
#[derive(Debug, Default)]
pub struct PersistedIndex {
    nodes: Vec<IndexNode>,
    dimensions: usize,
}

impl PersistedIndex {
    /// Load the index from `persist_dir`
    pub fn load(persist_dir: &Path) -> Result<Self> {
        if !persist_dir.is_dir() {
            return Err(Error::index(format!(
                "Persist directory {} does not exist",
                persist_dir.display()
            )));
        }

        let docstore: DocStoreFile = read_json(&persist_dir.join(DOCSTORE_FILE))?;
        let vectors: VectorStoreFile = read_json(&persist_dir.join(VECTOR_STORE_FILE))?;

        let mut docs = docstore.data;
        let mut nodes = Vec::with_capacity(vectors.embedding_dict.len());
        for (id, embedding) in vectors.embedding_dict {
            match docs.remove(&id) {
                Some(entry) => nodes.push(IndexNode {
                    id,
                    text: entry.data.text,
                    metadata: entry.data.metadata,
                    embedding,
                }),
                None => tracing::warn!("Embedding {} has no docstore entry, skipping", id),
            }
        }

        // Stable order so equal scores rank deterministically
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self::from_nodes(nodes)
    }

    /// Build an index from already loaded nodes
    pub fn from_nodes(nodes: Vec<IndexNode>) -> Result<Self> {
        let dimensions = nodes.first().map(|n| n.embedding.len()).unwrap_or(0);
        if let Some(bad) = nodes.iter().find(|n| n.embedding.len() != dimensions) {
            return Err(Error::index(format!(
                "Node {} has {} dimensions, expected {}",
                bad.id,
                bad.embedding.len(),
                dimensions
            )));
        }

        Ok(Self { nodes, dimensions })
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Embedding dimensions (0 when empty)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The `top_k` nodes most similar to `query`, best first
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredNode>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(Error::index(format!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredNode> = self
            .nodes
            .iter()
            .map(|node| ScoredNode {
                score: cosine_similarity(query, &node.embedding),
                node: node.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::index(format!("Cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::index(format!("Cannot parse {}: {}", path.display(), e)))
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_skips_orphan_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_store(dir.path());

        let index = PersistedIndex::load(dir.path()).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimensions(), 3);
    }

    #[test]
    fn test_search_ranks_by_cosine() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_store(dir.path());
        let index = PersistedIndex::load(dir.path()).unwrap();

        let results = index.search(&[0.0, 0.8, 0.6], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node.id, "node-cpi");
        assert_eq!(results[1].node.id, "node-gdp");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_missing_dir_is_index_error() {
        let result = PersistedIndex::load(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(Error::Index(_))));
    }

    #[test]
    fn test_missing_vector_file_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DOCSTORE_FILE), "{}").unwrap();
        assert!(matches!(PersistedIndex::load(dir.path()), Err(Error::Index(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_store(dir.path());
        let index = PersistedIndex::load(dir.path()).unwrap();

        assert!(matches!(index.search(&[1.0, 0.0], 1), Err(Error::Index(_))));
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
