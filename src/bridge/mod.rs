//! Human-in-the-loop rendezvous bridge.
//!
//! An autonomous run and the transport-facing request handler execute in
//! different invocation contexts and cannot share an in-memory future. The
//! bridge keeps a durable slot keyed by conversation id as the rendezvous
//! point: the run polls the slot until a companion inbound request deposits
//! the user's answer. Polling trades latency for simplicity and survives
//! process restarts on either side.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ParleyError, Result};

/// Durable rendezvous record for one conversation.
///
/// At most one outstanding slot per conversation exists at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HitlSlot {
    /// A run is suspended waiting for input.
    pub awaiting: bool,
    /// The user's answer, once deposited.
    pub payload: Option<String>,
}

/// Durable key-value storage for [`HitlSlot`] records.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn load(&self, conversation_id: &str) -> Result<Option<HitlSlot>>;
    async fn save(&self, conversation_id: &str, slot: &HitlSlot) -> Result<()>;
    async fn delete(&self, conversation_id: &str) -> Result<()>;
}

/// Bridge tuning knobs.
#[derive(Debug, Clone, Builder)]
pub struct BridgeConfig {
    /// Interval between slot polls while suspended.
    #[builder(default = Duration::from_millis(500))]
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Suspends autonomous runs until a human answer arrives out-of-band.
pub struct HitlBridge {
    store: Arc<dyn SlotStore>,
    config: BridgeConfig,
}

impl HitlBridge {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self {
            store,
            config: BridgeConfig::default(),
        }
    }

    pub fn with_config(store: Arc<dyn SlotStore>, config: BridgeConfig) -> Self {
        Self { store, config }
    }

    /// Suspend until input for this conversation arrives, then consume it.
    ///
    /// There is no hard deadline (human response time is unbounded); cancel
    /// through `cancel` instead. A payload that arrived before this call
    /// (late-arrival tolerance) is consumed immediately. Requesting input
    /// while another request is already pending for the same conversation is
    /// a caller bug and fails fast.
    pub async fn request_input(
        &self,
        conversation_id: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        match self.store.load(conversation_id).await? {
            Some(HitlSlot {
                payload: Some(payload),
                ..
            }) => {
                self.store.delete(conversation_id).await?;
                tracing::debug!(conversation_id, "consuming input that arrived early");
                return Ok(payload);
            }
            Some(slot) if slot.awaiting => {
                return Err(ParleyError::ContractViolation(format!(
                    "input request already pending for conversation {conversation_id}"
                )));
            }
            _ => {}
        }

        self.store
            .save(
                conversation_id,
                &HitlSlot {
                    awaiting: true,
                    payload: None,
                },
            )
            .await?;
        tracing::info!(conversation_id, prompt, "waiting for user input");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ParleyError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            match self.store.load(conversation_id).await? {
                Some(slot) => {
                    if let Some(payload) = slot.payload {
                        self.store.delete(conversation_id).await?;
                        tracing::debug!(conversation_id, "user input received");
                        return Ok(payload);
                    }
                }
                // Slot deleted out from under us: the conversation was
                // cleared while we were suspended.
                None => return Err(ParleyError::Cancelled),
            }
        }
    }

    /// Deposit the user's answer for a suspended run.
    ///
    /// Creates and fulfills the slot in one step when none exists yet;
    /// last writer wins.
    pub async fn provide_input(&self, conversation_id: &str, text: impl Into<String>) -> Result<()> {
        let slot = self
            .store
            .load(conversation_id)
            .await?
            .unwrap_or_default();
        self.store
            .save(
                conversation_id,
                &HitlSlot {
                    awaiting: slot.awaiting,
                    payload: Some(text.into()),
                },
            )
            .await?;
        tracing::debug!(conversation_id, "user input deposited");
        Ok(())
    }

    /// Whether a run is currently suspended waiting for input. Inbound
    /// handlers use this to route a user message to [`Self::provide_input`]
    /// instead of starting a fresh run.
    pub async fn is_awaiting(&self, conversation_id: &str) -> Result<bool> {
        Ok(self
            .store
            .load(conversation_id)
            .await?
            .map(|slot| slot.awaiting && slot.payload.is_none())
            .unwrap_or(false))
    }

    /// Delete any outstanding slot. Called on conversation clear so a zombie
    /// run cannot resume into a stale context.
    pub async fn clear(&self, conversation_id: &str) -> Result<()> {
        self.store.delete(conversation_id).await
    }
}
