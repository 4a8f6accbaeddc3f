//! Model-backed in-process participant.

use std::sync::Arc;

use async_trait::async_trait;

use super::AgentProxy;
use crate::error::Result;
use crate::model::{ModelRequest, ModelService};
use crate::types::{ConversationHistory, Utterance};

/// A participant answered by a model call with bound instructions.
pub struct LocalAgent {
    name: String,
    instructions: Option<String>,
    model: Arc<dyn ModelService>,
}

impl LocalAgent {
    pub fn new(name: impl Into<String>, model: Arc<dyn ModelService>) -> Self {
        Self {
            name: name.into(),
            instructions: None,
            model,
        }
    }

    /// Bind system instructions for this participant.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

#[async_trait]
impl AgentProxy for LocalAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, history: &ConversationHistory) -> Result<Vec<Utterance>> {
        let request = ModelRequest::builder()
            .maybe_instructions(self.instructions.clone())
            .messages(history.messages().to_vec())
            .build();

        let text = self.model.complete(&request).await?;
        if text.trim().is_empty() {
            tracing::debug!(participant = %self.name, "model produced no output");
            return Ok(Vec::new());
        }
        Ok(vec![Utterance::assistant(&self.name, text)])
    }
}
