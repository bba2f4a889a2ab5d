//! Per-user chat history kept in process memory

pub mod store;

pub use store::{ChatHistoryStore, TurnGuard};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role label for the assistant side of a conversation
pub const AI_ROLE: &str = "ai";

/// Who produced a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// The requesting user, labelled by username
    User(String),
    Ai,
}

impl Role {
    /// Wire label: the username for user messages, `"ai"` otherwise
    pub fn label(&self) -> &str {
        match self {
            Role::User(username) => username,
            Role::Ai => AI_ROLE,
        }
    }
}

/// A recorded chat message
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    /// User message stamped with the current local time
    pub fn user(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User(username.into()),
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    /// Assistant message stamped with the current local time
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    /// Wire form with the timestamp rendered through `format`
    pub fn view(&self, format: &str) -> MessageView {
        MessageView {
            role: self.role.label().to_string(),
            content: self.content.clone(),
            timestamp: self.timestamp.format(format).to_string(),
        }
    }
}

/// Serialized message as returned by `/chat` and `/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageView {
    /// Username for user messages, `ai` for replies
    #[schema(example = "alice")]
    pub role: String,
    pub content: String,
    #[schema(example = "2024-03-01 12:00:00")]
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::User("alice".to_string()).label(), "alice");
        assert_eq!(Role::User(String::new()).label(), "");
        assert_eq!(Role::Ai.label(), "ai");
    }

    #[test]
    fn test_view_formats_timestamp() {
        let message = Message {
            role: Role::User("bob".to_string()),
            content: "hi".to_string(),
            timestamp: Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap(),
        };

        let view = message.view("%Y-%m-%d %H:%M:%S");
        assert_eq!(view.role, "bob");
        assert_eq!(view.content, "hi");
        assert_eq!(view.timestamp, "2024-03-01 09:05:07");
    }
}
