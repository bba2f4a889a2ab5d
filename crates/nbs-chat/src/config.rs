//! Configuration for the chat service
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file named by `NBS_CONFIG`, and process environment (a `.env`
//! file in the working directory is loaded first).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default OpenAI API root
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Ollama API root
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// System prompt handed to the chat engine
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a chatbot, able to have normal interactions, as well as talk \
about data related to Nigeria. If you are asked anything out of context, just say you don't know \
you were trained on different data from the NBS";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Backend provider (openai or ollama)
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Persisted index configuration
    pub index: IndexConfig,
    /// Engine memory configuration
    pub memory: MemoryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ChatConfig {
    /// Load configuration from `.env`, the optional TOML file and the environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let mut config = match std::env::var("NBS_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Apply environment-style overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("NBS_LLM_BACKEND") {
            self.backend = backend.parse()?;
            if self.backend == BackendProvider::Ollama && self.llm.base_url == OPENAI_BASE_URL {
                self.llm.base_url = OLLAMA_BASE_URL.to_string();
            }
        }

        if let Some(key) = lookup("OPEN_AI_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }

        if let Some(host) = lookup("host").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }

        if let Some(port) = lookup("port").filter(|p| !p.is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid port '{}': {}", port, e)))?;
        }

        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = parse_flag(&debug);
        }

        if let Some(dir) = lookup("NBS_PERSIST_DIR").filter(|d| !d.is_empty()) {
            self.index.persist_dir = PathBuf::from(dir);
        }

        if let Some(file) = lookup("NBS_LOG_FILE").filter(|f| !f.is_empty()) {
            self.logging.file = PathBuf::from(file);
        }

        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendProvider::OpenAi
            && self.llm.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Config(
                "OPEN_AI_KEY must be set when using the openai backend".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "Temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }

        if self.server.max_sessions == 0 {
            return Err(Error::Config("max_sessions must be at least 1".to_string()));
        }

        if self.index.similarity_top_k == 0 {
            return Err(Error::Config("similarity_top_k must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Socket address string for the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Debug mode (verbose logging)
    pub debug: bool,
    /// Enable CORS
    pub enable_cors: bool,
    /// Serve Swagger UI at /swagger
    pub enable_swagger: bool,
    /// chrono format string used for every serialized message timestamp
    pub timestamp_format: String,
    /// Name of the browser session cookie
    pub session_cookie: String,
    /// Seconds a session survives without a chat request
    pub session_ttl_secs: u64,
    /// Upper bound on live sessions; the least recently seen is evicted first
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            enable_cors: true,
            enable_swagger: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            session_cookie: "nbs_session".to_string(),
            session_ttl_secs: 24 * 60 * 60,
            max_sessions: 10_000,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key (required for OpenAI)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// System prompt for the chat engine
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.6,
            timeout_secs: 120,
            max_retries: 2,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model; must match the model the index was built with
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
        }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding `docstore.json` and `default__vector_store.json`
    pub persist_dir: PathBuf,
    /// Number of nodes retrieved per question
    pub similarity_top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("./store"),
            similarity_top_k: 2,
        }
    }
}

/// Engine memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Token budget of the conversational memory window
    pub token_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { token_limit: 1500 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// File receiving the application log
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("app.log"),
        }
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// OpenAI chat completions and embeddings
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::str::FromStr for BackendProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!("Unknown LLM backend '{}'", other))),
        }
    }
}
