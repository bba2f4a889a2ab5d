//! HTTP routes for the chat server

pub mod chat;
pub mod history;
pub mod home;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Page and chat API routes
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/chat", post(chat::chat))
        .route("/history", get(history::history))
}
