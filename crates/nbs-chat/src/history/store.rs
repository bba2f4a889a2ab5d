//! Username-keyed history store with per-user turn serialization

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Message, MessageView};

/// Held for the duration of one chat turn
pub type TurnGuard = OwnedMutexGuard<()>;

#[derive(Default)]
struct UserHistory {
    /// Serializes turns; never held while only reading
    turn: Arc<Mutex<()>>,
    messages: RwLock<Vec<Message>>,
}

/// In-memory chat history for all users
///
/// Append-only, no eviction. Entries live until the process exits.
#[derive(Default)]
pub struct ChatHistoryStore {
    users: DashMap<String, Arc<UserHistory>>,
}

impl ChatHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, username: &str) -> Arc<UserHistory> {
        if let Some(history) = self.users.get(username) {
            return history.value().clone();
        }
        self.users
            .entry(username.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Create the user's history if needed and wait for exclusive use of it
    ///
    /// Concurrent turns of the same user run one after another; different
    /// users do not contend.
    pub async fn begin_turn(&self, username: &str) -> TurnGuard {
        let turn = Arc::clone(&self.entry(username).turn);
        turn.lock_owned().await
    }

    /// Append a message, creating the user's history if needed
    pub fn append(&self, username: &str, message: Message) {
        self.entry(username).messages.write().push(message);
    }

    /// Snapshot of a user's messages; unknown users yield an empty list
    pub fn get(&self, username: &str) -> Vec<Message> {
        self.users
            .get(username)
            .map(|history| history.messages.read().clone())
            .unwrap_or_default()
    }

    /// Wire form of a user's messages
    pub fn views(&self, username: &str, timestamp_format: &str) -> Vec<MessageView> {
        self.users
            .get(username)
            .map(|history| {
                history
                    .messages
                    .read()
                    .iter()
                    .map(|message| message.view(timestamp_format))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Number of users with a history
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Role;
    use std::time::Duration;

    #[test]
    fn test_unknown_user_is_empty_and_not_created() {
        let store = ChatHistoryStore::new();
        assert!(store.get("nobody").is_empty());
        assert!(store.views("nobody", "%H").is_empty());
        assert!(!store.contains("nobody"));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_append_preserves_order_per_user() {
        let store = ChatHistoryStore::new();
        store.append("alice", Message::user("alice", "q1"));
        store.append("bob", Message::user("bob", "other"));
        store.append("alice", Message::ai("a1"));

        let alice = store.get("alice");
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].role, Role::User("alice".to_string()));
        assert_eq!(alice[1].role, Role::Ai);
        assert_eq!(alice[1].content, "a1");
        assert_eq!(store.get("bob").len(), 1);
    }

    #[tokio::test]
    async fn test_begin_turn_creates_entry() {
        let store = ChatHistoryStore::new();
        let _turn = store.begin_turn("carol").await;
        assert!(store.contains("carol"));
        assert!(store.get("carol").is_empty());
    }

    #[tokio::test]
    async fn test_turns_of_one_user_never_interleave() {
        let store = Arc::new(ChatHistoryStore::new());

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let _turn = store.begin_turn("alice").await;
                store.append("alice", Message::user("alice", format!("q{}", i)));
                tokio::time::sleep(Duration::from_millis(5)).await;
                store.append("alice", Message::ai(format!("a{}", i)));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let messages = store.get("alice");
        assert_eq!(messages.len(), 16);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User("alice".to_string()));
            assert_eq!(pair[1].role, Role::Ai);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_turns() {
        let store = ChatHistoryStore::new();
        store.append("dave", Message::user("dave", "q"));

        let _turn = store.begin_turn("dave").await;
        assert_eq!(store.get("dave").len(), 1);
    }
}
