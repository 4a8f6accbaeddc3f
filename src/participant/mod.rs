//! Participants: local, remote, and human-backed responders.

mod human;
mod local;
mod remote;

pub use human::HumanParticipant;
pub use local::LocalAgent;
pub use remote::RemoteAgent;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConversationHistory, Utterance};

/// A conversation participant able to take a turn.
///
/// The orchestrator depends only on this trait; whether responses come from
/// an in-process model, a remote service, or a human is invisible to it.
#[async_trait]
pub trait AgentProxy: Send + Sync {
    fn name(&self) -> &str;

    /// Produce zero or more utterances given the conversation so far.
    /// Returning an empty vec is a legitimate "nothing to say".
    async fn respond(&self, history: &ConversationHistory) -> Result<Vec<Utterance>>;
}
