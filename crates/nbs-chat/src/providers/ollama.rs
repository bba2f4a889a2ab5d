//! Ollama-based provider for embeddings and chat
//!
//! Talks to a local Ollama server (`/api/chat`, `/api/embeddings`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::http::{build_client, check_status, retry_request};
use super::llm::{ChatMessage, LlmProvider};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
    embed_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
            embed_model: embeddings.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.url("api/chat");
        let client = &self.client;
        let model = self.config.model.as_str();
        let temperature = self.config.temperature;
        let url = url.as_str();

        tracing::debug!("Generating answer with model: {}", model);

        retry_request(self.config.max_retries, || async move {
            let request = ChatRequest {
                model,
                messages,
                stream: false,
                options: GenerateOptions { temperature },
            };

            let response = client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Llm(format!("Generation request failed: {}", e)))?;

            let chat_response: ChatResponse = check_status(response, "Generation")
                .await?
                .json()
                .await
                .map_err(|e| Error::Llm(format!("Failed to parse generation response: {}", e)))?;

            Ok(chat_response.message.content)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.url("api/embeddings");
        let client = &self.client;
        let model = self.embed_model.as_str();
        let url = url.as_str();

        retry_request(self.config.max_retries, || async move {
            let request = EmbedRequest { model, prompt: text };

            let response = client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Embedding(format!("Embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::Embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

            Ok(embed_response.embedding)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        LlmProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::serve_mock;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    fn client_for(base_url: String) -> OllamaClient {
        let config = LlmConfig {
            base_url,
            model: "llama3.2:3b".to_string(),
            max_retries: 0,
            ..LlmConfig::default()
        };
        let embeddings = EmbeddingConfig {
            model: "nomic-embed-text".to_string(),
        };
        OllamaClient::new(&config, &embeddings).unwrap()
    }

    #[tokio::test]
    async fn test_chat_is_not_streamed() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["stream"], false);
                assert_eq!(body["model"], "llama3.2:3b");
                Json(json!({ "message": { "role": "assistant", "content": "Abuja." }, "done": true }))
            }),
        );
        let client = client_for(serve_mock(router).await);

        let reply = client.chat(&[ChatMessage::user("Capital?")]).await.unwrap();
        assert_eq!(reply, "Abuja.");
    }

    #[tokio::test]
    async fn test_embed_uses_prompt_field() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["prompt"], "lagos");
                Json(json!({ "embedding": [1.0, 0.0, 0.0] }))
            }),
        );
        let client = client_for(serve_mock(router).await);

        assert_eq!(client.embed("lagos").await.unwrap(), vec![1.0, 0.0, 0.0]);
    }
}
