//! nbs-chat: chat service answering questions about NBS data
//!
//! Questions go through a retrieval-augmented chat engine backed by a
//! persisted vector index; each user's transcript is kept in memory and
//! returned alongside every answer.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod index;
pub mod logging;
pub mod providers;
pub mod server;
pub mod session;
pub mod types;

pub use config::ChatConfig;
pub use engine::{ChatEngine, ChatResponse, ContextChatEngine};
pub use error::{Error, Result};
pub use history::{ChatHistoryStore, Message, MessageView, Role};
pub use server::ChatServer;
