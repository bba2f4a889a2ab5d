//! Provider abstractions for embeddings and LLM chat
//!
//! This module provides trait-based abstractions that allow switching between
//! the OpenAI API and a local Ollama server.

pub mod embedding;
pub mod http;
pub mod llm;
pub mod ollama;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, ChatRole, LlmProvider};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use std::sync::Arc;

use crate::config::{BackendProvider, ChatConfig};
use crate::error::Result;

/// Build the embedding and LLM providers for the configured backend
pub fn from_config(config: &ChatConfig) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    match config.backend {
        BackendProvider::OpenAi => {
            let client = Arc::new(OpenAiClient::new(&config.llm, &config.embeddings)?);
            tracing::info!("Using OpenAI backend (model: {})", config.llm.model);
            let embedder: Arc<dyn EmbeddingProvider> = client.clone();
            let llm: Arc<dyn LlmProvider> = client;
            Ok((embedder, llm))
        }
        BackendProvider::Ollama => {
            let client = Arc::new(OllamaClient::new(&config.llm, &config.embeddings)?);
            tracing::info!(
                "Using Ollama backend at {} (model: {})",
                config.llm.base_url,
                config.llm.model
            );
            let embedder: Arc<dyn EmbeddingProvider> = client.clone();
            let llm: Arc<dyn LlmProvider> = client;
            Ok((embedder, llm))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_backend_requires_key() {
        assert!(from_config(&ChatConfig::default()).is_err());
    }

    #[test]
    fn test_providers_share_backend() {
        let mut config = ChatConfig::default();
        config.llm.api_key = Some("sk-test".to_string());

        let (embedder, llm) = from_config(&config).unwrap();
        assert_eq!(embedder.name(), "openai");
        assert_eq!(llm.name(), "openai");
        assert_eq!(llm.model(), "gpt-3.5-turbo");
    }
}
