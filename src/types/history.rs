//! Append-only conversation history with windowed views.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::message::{Message, Utterance};

/// Ordered log of conversation messages.
///
/// Append-only during a turn. Windowed views used by decision functions are
/// plain slices into the log; truncation never mutates the authoritative
/// history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    next_ordinal: u64,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an utterance, assigning the next ordinal and a timestamp.
    pub fn append(&mut self, utterance: Utterance) -> &Message {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        self.messages.push(Message {
            role: utterance.role,
            author: utterance.author,
            content: utterance.content,
            ordinal,
            timestamp: Some(Utc::now()),
        });
        // just pushed, so the log is non-empty
        self.messages.last().expect("history is non-empty")
    }

    /// Append a user message.
    pub fn add_user_message(&mut self, text: impl Into<String>) -> &Message {
        self.append(Utterance::user(text))
    }

    /// Append an assistant message attributed to a participant.
    pub fn add_assistant_message(
        &mut self,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> &Message {
        self.append(Utterance::assistant(author, text))
    }

    /// All messages, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// A view of the last `n` messages. The full log is returned when it is
    /// shorter than `n`.
    pub fn window(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
