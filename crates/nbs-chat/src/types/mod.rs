//! Wire types for the HTTP API

pub mod chat;

pub use chat::{ChatForm, ChatRequest, ChatResponseBody, HistoryResponse, UserQuery};
