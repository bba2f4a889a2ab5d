//! Context chat engine: retrieve, prompt with memory, generate

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::index::{PersistedIndex, VectorRetriever};
use crate::providers::{ChatMessage, EmbeddingProvider, LlmProvider};

use super::memory::{estimate_tokens, ChatMemoryBuffer};
use super::prompt::PromptBuilder;
use super::{ChatEngine, ChatResponse, SourceNode};

/// Chat engine that puts retrieved context into the system message
///
/// One instance serves every user, so the memory window is process-wide.
pub struct ContextChatEngine {
    retriever: VectorRetriever,
    llm: Arc<dyn LlmProvider>,
    memory: ChatMemoryBuffer,
    system_prompt: String,
}

impl ContextChatEngine {
    pub fn new(
        retriever: VectorRetriever,
        llm: Arc<dyn LlmProvider>,
        memory: ChatMemoryBuffer,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            llm,
            memory,
            system_prompt: system_prompt.into(),
        }
    }

    /// Assemble the engine from configuration and already built providers
    pub fn from_config(
        config: &ChatConfig,
        index: Arc<PersistedIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let retriever = VectorRetriever::new(index, embedder, config.index.similarity_top_k);
        let memory = ChatMemoryBuffer::new(config.memory.token_limit);
        Self::new(retriever, llm, memory, config.llm.system_prompt.clone())
    }

    pub fn memory(&self) -> &ChatMemoryBuffer {
        &self.memory
    }
}

#[async_trait]
impl ChatEngine for ContextChatEngine {
    async fn chat(&self, message: &str) -> Result<ChatResponse> {
        let nodes = self.retriever.retrieve(message).await?;

        let system = PromptBuilder::build_system_message(&self.system_prompt, &nodes);
        let history = self.memory.get(estimate_tokens(&system));

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let text = self.llm.chat(&messages).await?;

        self.memory
            .put_exchange(ChatMessage::user(message), ChatMessage::assistant(text.clone()));

        Ok(ChatResponse {
            text,
            source_nodes: nodes.into_iter().map(SourceNode::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::persisted::fixtures;
    use crate::providers::ChatRole;
    use parking_lot::Mutex;

    /// Embeds every text onto the "population" axis
    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    /// Records requests and answers with a fixed reply
    struct RecordingLlm {
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        fail: bool,
    }

    impl RecordingLlm {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            self.requests.lock().push(messages.to_vec());
            if self.fail {
                return Err(Error::llm("upstream unavailable"));
            }
            Ok(format!("answer #{}", self.requests.lock().len()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "test"
        }
    }

    fn engine(llm: Arc<RecordingLlm>) -> (ContextChatEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_store(dir.path());
        let index = Arc::new(PersistedIndex::load(dir.path()).unwrap());

        let retriever = VectorRetriever::new(index, Arc::new(AxisEmbedder), 2);
        let engine = ContextChatEngine::new(retriever, llm, ChatMemoryBuffer::new(1500), "You are a chatbot.");
        (engine, dir)
    }

    #[tokio::test]
    async fn test_chat_injects_retrieved_context() {
        let llm = RecordingLlm::new(false);
        let (engine, _dir) = engine(llm.clone());

        let response = engine.chat("What is Nigeria's population?").await.unwrap();
        assert_eq!(response.to_string(), "answer #1");
        assert_eq!(response.source_nodes[0].id, "node-pop");

        let requests = llm.requests.lock();
        let sent = &requests[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, ChatRole::System);
        assert!(sent[0].content.starts_with("You are a chatbot.\nContext information is below."));
        assert!(sent[0].content.contains("216 million"));
        assert_eq!(sent[1], ChatMessage::user("What is Nigeria's population?"));
    }

    #[tokio::test]
    async fn test_memory_is_replayed_on_next_turn() {
        let llm = RecordingLlm::new(false);
        let (engine, _dir) = engine(llm.clone());

        engine.chat("first").await.unwrap();
        engine.chat("second").await.unwrap();

        let requests = llm.requests.lock();
        let sent = &requests[1];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[1], ChatMessage::user("first"));
        assert_eq!(sent[2], ChatMessage::assistant("answer #1"));
        assert_eq!(sent[3], ChatMessage::user("second"));
        assert_eq!(engine.memory().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_memory_untouched() {
        let llm = RecordingLlm::new(true);
        let (engine, _dir) = engine(llm);

        assert!(matches!(engine.chat("hello").await, Err(Error::Llm(_))));
        assert!(engine.memory().is_empty());
    }
}
