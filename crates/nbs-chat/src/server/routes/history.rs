//! Chat history endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::server::state::AppState;
use crate::types::{HistoryResponse, UserQuery};

/// GET /history - A user's conversation so far
///
/// Read-only: asking about an unknown user does not create a history.
#[utoipa::path(
    get,
    path = "/history",
    tag = "chat",
    params(UserQuery),
    responses(
        (status = 200, description = "Messages in the order they were produced", body = HistoryResponse),
    )
)]
pub async fn history(State(state): State<AppState>, Query(query): Query<UserQuery>) -> Json<HistoryResponse> {
    let chat_history = state.history().views(&query.username, state.timestamp_format());
    tracing::debug!("History for '{}': {} messages", query.username, chat_history.len());
    Json(HistoryResponse { chat_history })
}
