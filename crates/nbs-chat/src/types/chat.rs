//! Request and response bodies of the chat endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::history::MessageView;

/// Query string shared by `/chat` and `/history`
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Username owning the conversation; empty when omitted
    #[serde(default)]
    pub username: String,
}

/// JSON body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(example = "What is Nigeria's population?")]
    pub input: String,
}

/// Form body of `POST /chat`; a missing field is an empty question
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub input: String,
}

/// Reply to a chat turn: the answer plus the user's whole history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponseBody {
    pub response: String,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub chat_history: Vec<MessageView>,
}
