//! Message types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role within a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A message appended to a [`ConversationHistory`](super::ConversationHistory).
///
/// The ordinal is assigned at append time, is strictly increasing within one
/// history, and is never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub content: String,
    pub ordinal: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A message draft produced by a participant, before the orchestrator has
/// assigned it an ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub role: Role,
    pub author: Option<String>,
    pub content: String,
}

impl Utterance {
    /// Create a user utterance.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            author: None,
            content: text.into(),
        }
    }

    /// Create an assistant utterance attributed to a participant.
    pub fn assistant(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            author: Some(author.into()),
            content: text.into(),
        }
    }

    /// Create a system utterance.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            author: None,
            content: text.into(),
        }
    }

    /// Whether the content is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
