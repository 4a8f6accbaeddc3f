//! Conversation context persistence.
//!
//! The store is a collaborator boundary: the core defines the trait and the
//! persisted unit, plus an in-memory implementation and a JSON-on-disk
//! implementation for durable local use.

pub mod fs;
pub mod memory;

pub use fs::{FsContextStore, FsSlotStore};
pub use memory::{MemoryContextStore, MemorySlotStore};

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ConversationHistory;

/// The persisted unit: history plus the remote-session sidecar.
///
/// The sidecar maps a remote participant's name to the conversation id it
/// holds against its service, so a client can resume that conversation after
/// a process restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub conversation_id: String,
    pub history: ConversationHistory,
    #[serde(default)]
    pub remote_sessions: HashMap<String, String>,
}

impl ConversationState {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            history: ConversationHistory::new(),
            remote_sessions: HashMap::new(),
        }
    }
}

/// Load/save/archive of conversation state, keyed by conversation id.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the live state. Absent or unreadable state yields a fresh one.
    async fn load(&self, conversation_id: &str) -> Result<ConversationState>;

    /// Persist the live state.
    async fn save(&self, state: &ConversationState) -> Result<()>;

    /// Move the live state to a timestamped record and clear the live slot.
    /// A no-op when no live state exists.
    async fn archive(&self, conversation_id: &str) -> Result<()>;
}
