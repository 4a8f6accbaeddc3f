//! Model service seam.
//!
//! The core treats "ask a model to produce a response given a history" as an
//! opaque capability; hosts plug in whatever backend they use.

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Message;

/// Requested response format for a completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// One completion request: system instructions plus a history view.
#[derive(Debug, Clone, Builder)]
pub struct ModelRequest {
    #[builder(into)]
    pub instructions: Option<String>,
    pub messages: Vec<Message>,
    pub response_format: Option<ResponseFormat>,
}

/// Capability to complete a conversation with a model.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Produce a completion for the request. When a JSON response format is
    /// requested the returned text is expected to be valid JSON of that
    /// shape.
    async fn complete(&self, request: &ModelRequest) -> Result<String>;
}
