//! Chat engine adapter: retrieval-augmented answers for a single question

pub mod context;
pub mod memory;
pub mod prompt;

pub use context::ContextChatEngine;
pub use memory::ChatMemoryBuffer;
pub use prompt::PromptBuilder;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::error::Result;
use crate::index::ScoredNode;

/// Engine output; its text form is what gets recorded and returned
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub text: String,
    pub source_nodes: Vec<SourceNode>,
}

/// Retrieved node that contributed to a response
#[derive(Debug, Clone, Serialize)]
pub struct SourceNode {
    pub id: String,
    pub score: f32,
}

impl From<ScoredNode> for SourceNode {
    fn from(scored: ScoredNode) -> Self {
        Self {
            id: scored.node.id,
            score: scored.score,
        }
    }
}

impl fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for ChatResponse {
    fn from(text: String) -> Self {
        Self {
            text,
            source_nodes: Vec::new(),
        }
    }
}

/// Anything that answers a question in the context of an ongoing conversation
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn chat(&self, message: &str) -> Result<ChatResponse>;
}
