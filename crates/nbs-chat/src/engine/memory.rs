//! Bounded conversational memory replayed to the LLM

use parking_lot::Mutex;

use crate::providers::{ChatMessage, ChatRole};

/// Rough token estimate: one token per four characters, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Message buffer that only hands back the newest messages fitting a token budget
///
/// Everything is kept; trimming happens when the window is read.
pub struct ChatMemoryBuffer {
    token_limit: usize,
    messages: Mutex<Vec<ChatMessage>>,
}

impl ChatMemoryBuffer {
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }

    /// Record a user/assistant exchange atomically
    pub fn put_exchange(&self, user: ChatMessage, assistant: ChatMessage) {
        let mut messages = self.messages.lock();
        messages.push(user);
        messages.push(assistant);
    }

    /// Newest messages fitting in the budget left after `initial_tokens`
    ///
    /// The window never starts with an assistant message.
    pub fn get(&self, initial_tokens: usize) -> Vec<ChatMessage> {
        let budget = self.token_limit.saturating_sub(initial_tokens);
        let messages = self.messages.lock();

        let mut used = 0;
        let mut start = messages.len();
        while start > 0 {
            let cost = estimate_tokens(&messages[start - 1].content);
            if used + cost > budget {
                break;
            }
            used += cost;
            start -= 1;
        }

        while start < messages.len() && messages[start].role == ChatRole::Assistant {
            start += 1;
        }

        messages[start..].to_vec()
    }

    /// Number of stored messages (including ones outside the window)
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}
