//! Wire shapes for the remote agent service.

use serde::{Deserialize, Serialize};

pub(crate) const ACTIVITY_MESSAGE: &str = "message";
pub(crate) const ACTIVITY_TYPING: &str = "typing";

/// Sender identity on an activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelAccount {
    pub id: String,
}

/// Attachment carried on an activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

/// One activity on the channel, outbound or pushed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<serde_json::Value>,
}

impl Activity {
    /// Build an outbound message activity.
    pub fn message(from_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: ACTIVITY_MESSAGE.to_string(),
            from: ChannelAccount { id: from_id.into() },
            text: Some(text.into()),
            attachments: None,
            channel_data: None,
        }
    }
}

/// A pushed frame: a batch of activities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySet {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// Response to conversation creation and lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInfo {
    pub conversation_id: String,
    #[serde(default)]
    pub stream_url: Option<String>,
}

/// Correlation for a posted activity.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ActivityReceipt {
    #[serde(default)]
    pub id: Option<String>,
}
