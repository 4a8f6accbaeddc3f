//! Convenient re-exports for common usage.

pub use crate::bridge::{BridgeConfig, HitlBridge, HitlSlot, SlotStore};
pub use crate::decision::{SelectionStrategy, TerminationStrategy};
pub use crate::error::{ParleyError, Result};
pub use crate::model::{ModelRequest, ModelService, ResponseFormat};
pub use crate::orchestrator::{
    OrchestratorConfig, Participant, StopReason, TurnOrchestrator,
};
pub use crate::participant::{AgentProxy, HumanParticipant, LocalAgent, RemoteAgent};
pub use crate::remote::{ConnectionState, RemoteAgentClient, RemoteClientConfig};
pub use crate::secret::{EnvSecretProvider, SecretProvider, StaticSecretProvider};
pub use crate::store::{
    ContextStore, ConversationState, FsContextStore, FsSlotStore, MemoryContextStore,
    MemorySlotStore,
};
pub use crate::types::{
    ConversationHistory, Message, ParticipantKind, ParticipantProfile, Role, Utterance, Verdict,
};
