//! OpenAI client for chat completions and query embeddings

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::http::{build_client, check_status, retry_request};
use super::llm::{ChatMessage, LlmProvider};

/// OpenAI API client with automatic retry
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
    api_key: String,
    embed_model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(config: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key is missing".to_string()))?;

        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
            api_key,
            embed_model: embeddings.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.url("chat/completions");

        tracing::debug!(
            "Requesting completion from {} ({} messages)",
            self.config.model,
            messages.len()
        );

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let model = self.config.model.as_str();
        let temperature = self.config.temperature;
        let url = url.as_str();

        retry_request(self.config.max_retries, || async move {
            let request = CompletionRequest {
                model,
                messages,
                temperature,
            };

            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Llm(format!("Completion request failed: {}", e)))?;

            let completion: CompletionResponse = check_status(response, "Completion")
                .await?
                .json()
                .await
                .map_err(|e| Error::Llm(format!("Failed to parse completion response: {}", e)))?;

            completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| Error::llm("Completion response contained no message"))
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.url("embeddings");

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let model = self.embed_model.as_str();
        let url = url.as_str();

        retry_request(self.config.max_retries, || async move {
            let request = EmbedRequest { model, input: text };

            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::Embedding(format!("Embedding request failed: {}", e)))?;

            let response = check_status(response, "Embedding")
                .await
                .map_err(|e| Error::Embedding(e.to_string()))?;

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

            embed_response
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| Error::embedding("Embedding response contained no data"))
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        LlmProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
