//! Participant backed by a remote agent service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::AgentProxy;
use crate::error::Result;
use crate::remote::RemoteAgentClient;
use crate::types::{ConversationHistory, Utterance};

/// A participant whose turns round-trip through a [`RemoteAgentClient`].
///
/// The latest history entry is forwarded as the request text, with the full
/// history attached as opaque channel data so the remote service can see the
/// conversation so far.
pub struct RemoteAgent {
    client: Arc<RemoteAgentClient>,
}

impl RemoteAgent {
    pub fn new(client: Arc<RemoteAgentClient>) -> Self {
        Self { client }
    }

    /// The underlying client, for session lifecycle management.
    pub fn client(&self) -> &Arc<RemoteAgentClient> {
        &self.client
    }
}

#[async_trait]
impl AgentProxy for RemoteAgent {
    fn name(&self) -> &str {
        self.client.agent_name()
    }

    async fn respond(&self, history: &ConversationHistory) -> Result<Vec<Utterance>> {
        let text = history
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        let channel_data = json!({ "history": history });

        self.client.send(&text, Vec::new(), Some(channel_data)).await?;
        let reply = self
            .client
            .await_response(self.client.config().timeout)
            .await?;

        if reply.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Utterance::assistant(self.client.agent_name(), reply)])
    }
}
