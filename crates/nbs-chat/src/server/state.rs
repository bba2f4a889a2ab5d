//! Application state for the chat server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::engine::{ChatEngine, ContextChatEngine};
use crate::error::Result;
use crate::history::ChatHistoryStore;
use crate::index::PersistedIndex;
use crate::providers;
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ChatConfig,
    /// Single engine shared by every user
    engine: Arc<dyn ChatEngine>,
    history: ChatHistoryStore,
    sessions: SessionStore,
    ready: RwLock<bool>,
}

impl AppState {
    /// Load the persisted index, connect providers and build the chat engine
    pub async fn new(config: ChatConfig) -> Result<Self> {
        tracing::info!("Initializing chat state (backend: {:?})...", config.backend);

        let index = Arc::new(PersistedIndex::load(&config.index.persist_dir)?);
        tracing::info!(
            "Loaded {} nodes ({} dimensions) from {}",
            index.len(),
            index.dimensions(),
            config.index.persist_dir.display()
        );

        let (embedder, llm) = providers::from_config(&config)?;
        match llm.health_check().await {
            Ok(true) => tracing::info!("LLM provider {} is reachable", llm.name()),
            _ => tracing::warn!("LLM provider {} is not reachable yet", llm.name()),
        }

        let engine = ContextChatEngine::from_config(&config, index, embedder, llm);
        Ok(Self::with_engine(config, Arc::new(engine)))
    }

    /// State around an already constructed engine
    pub fn with_engine(config: ChatConfig, engine: Arc<dyn ChatEngine>) -> Self {
        let sessions = SessionStore::from_config(&config.server);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                history: ChatHistoryStore::new(),
                sessions,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &Arc<dyn ChatEngine> {
        &self.inner.engine
    }

    pub fn history(&self) -> &ChatHistoryStore {
        &self.inner.history
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Format applied to every serialized timestamp
    pub fn timestamp_format(&self) -> &str {
        &self.inner.config.server.timestamp_format
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
