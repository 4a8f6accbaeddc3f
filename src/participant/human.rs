//! Human participant: suspends the run on the input bridge.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::AgentProxy;
use crate::bridge::HitlBridge;
use crate::error::Result;
use crate::types::{ConversationHistory, Role, Utterance};

/// A participant answered by a human, reached through the HITL bridge.
///
/// When invoked in an autonomous run, `respond` suspends until a companion
/// inbound request deposits the user's answer.
pub struct HumanParticipant {
    name: String,
    conversation_id: String,
    bridge: Arc<HitlBridge>,
    cancel: CancellationToken,
}

impl HumanParticipant {
    pub fn new(
        name: impl Into<String>,
        conversation_id: impl Into<String>,
        bridge: Arc<HitlBridge>,
    ) -> Self {
        Self {
            name: name.into(),
            conversation_id: conversation_id.into(),
            bridge,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token so a conversation reset or process
    /// shutdown can abort the suspension.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl AgentProxy for HumanParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, history: &ConversationHistory) -> Result<Vec<Utterance>> {
        let prompt = history
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();

        let text = self
            .bridge
            .request_input(&self.conversation_id, &prompt, &self.cancel)
            .await?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Utterance {
            role: Role::User,
            author: Some(self.name.clone()),
            content: text,
        }])
    }
}
