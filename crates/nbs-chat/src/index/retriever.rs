//! Query-time retrieval over the persisted index

use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;

use super::persisted::{PersistedIndex, ScoredNode};

/// Embeds a question and returns the closest index nodes
pub struct VectorRetriever {
    index: Arc<PersistedIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(index: Arc<PersistedIndex>, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self { index, embedder, top_k }
    }

    /// Retrieve the `top_k` nodes for `query`
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredNode>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let nodes = self.index.search(&embedding, self.top_k)?;

        tracing::debug!(
            "Retrieved {} nodes (best score {:.3}) via {}",
            nodes.len(),
            nodes.first().map(|n| n.score).unwrap_or(0.0),
            self.embedder.name()
        );

        Ok(nodes)
    }
}
