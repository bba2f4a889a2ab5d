//! Persisted vector index and retrieval

pub mod persisted;
pub mod retriever;

pub use persisted::{IndexNode, PersistedIndex, ScoredNode};
pub use retriever::VectorRetriever;
