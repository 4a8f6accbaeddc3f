//! In-memory store implementations (single process, tests).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ContextStore, ConversationState};
use crate::bridge::{HitlSlot, SlotStore};
use crate::error::Result;

/// In-memory [`ContextStore`]. Archived states are kept, newest last.
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    live: Mutex<HashMap<String, ConversationState>>,
    archived: Mutex<HashMap<String, Vec<ConversationState>>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archived states for a conversation, oldest first.
    pub fn archived(&self, conversation_id: &str) -> Vec<ConversationState> {
        self.archived
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn load(&self, conversation_id: &str) -> Result<ConversationState> {
        Ok(self
            .live
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(|| ConversationState::new(conversation_id)))
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        self.live
            .lock()
            .unwrap()
            .insert(state.conversation_id.clone(), state.clone());
        Ok(())
    }

    async fn archive(&self, conversation_id: &str) -> Result<()> {
        let removed = self.live.lock().unwrap().remove(conversation_id);
        if let Some(state) = removed {
            self.archived
                .lock()
                .unwrap()
                .entry(conversation_id.to_string())
                .or_default()
                .push(state);
        }
        Ok(())
    }
}

/// In-memory [`SlotStore`].
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, HitlSlot>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn load(&self, conversation_id: &str) -> Result<Option<HitlSlot>> {
        Ok(self.slots.lock().unwrap().get(conversation_id).cloned())
    }

    async fn save(&self, conversation_id: &str, slot: &HitlSlot) -> Result<()> {
        self.slots
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), slot.clone());
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.slots.lock().unwrap().remove(conversation_id);
        Ok(())
    }
}
