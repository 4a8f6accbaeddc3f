//! JSON-file-backed store implementations.
//!
//! Layout under the root directory:
//!
//! ```text
//! {root}/{conversation_id}/context.json              live state
//! {root}/{conversation_id}/{timestamp}_context.json  archived state
//! {root}/{conversation_id}/input_slot.json           HITL rendezvous slot
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{ContextStore, ConversationState};
use crate::bridge::{HitlSlot, SlotStore};
use crate::error::{ParleyError, Result};

const CONTEXT_FILE: &str = "context.json";
const SLOT_FILE: &str = "input_slot.json";

/// Filesystem-backed [`ContextStore`].
#[derive(Debug, Clone)]
pub struct FsContextStore {
    root: PathBuf,
}

impl FsContextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn live_path(&self, conversation_id: &str) -> PathBuf {
        self.root.join(conversation_id).join(CONTEXT_FILE)
    }
}

#[async_trait]
impl ContextStore for FsContextStore {
    async fn load(&self, conversation_id: &str) -> Result<ConversationState> {
        match tokio::fs::read(self.live_path(conversation_id)).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => Ok(state),
                Err(e) => {
                    tracing::warn!(
                        conversation_id,
                        error = %e,
                        "unreadable conversation state, starting fresh"
                    );
                    Ok(ConversationState::new(conversation_id))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Ok(ConversationState::new(conversation_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        let dir = self.root.join(&state.conversation_id);
        tokio::fs::create_dir_all(&dir).await?;
        let bytes = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(dir.join(CONTEXT_FILE), bytes).await?;
        Ok(())
    }

    async fn archive(&self, conversation_id: &str) -> Result<()> {
        let live = self.live_path(conversation_id);
        let bytes = match tokio::fs::read(&live).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let timestamp = Utc::now().format("%Y%m%dT%H%M%S");
        let archived = self
            .root
            .join(conversation_id)
            .join(format!("{timestamp}_{CONTEXT_FILE}"));
        tokio::fs::write(&archived, bytes).await?;
        tokio::fs::remove_file(&live).await?;
        tracing::info!(conversation_id, path = %archived.display(), "conversation archived");
        Ok(())
    }
}

/// Filesystem-backed [`SlotStore`].
#[derive(Debug, Clone)]
pub struct FsSlotStore {
    root: PathBuf,
}

impl FsSlotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, conversation_id: &str) -> PathBuf {
        self.root.join(conversation_id).join(SLOT_FILE)
    }
}

#[async_trait]
impl SlotStore for FsSlotStore {
    async fn load(&self, conversation_id: &str) -> Result<Option<HitlSlot>> {
        match tokio::fs::read(self.slot_path(conversation_id)).await {
            Ok(bytes) => {
                let slot = serde_json::from_slice(&bytes)
                    .map_err(|e| ParleyError::Store(format!("corrupt input slot: {e}")))?;
                Ok(Some(slot))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, conversation_id: &str, slot: &HitlSlot) -> Result<()> {
        let path = self.slot_path(conversation_id);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec(slot)?).await?;
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.slot_path(conversation_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
