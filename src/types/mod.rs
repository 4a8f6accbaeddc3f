//! Core conversation types.

pub mod history;
pub mod message;
pub mod participant;
pub mod verdict;

pub use history::ConversationHistory;
pub use message::{Message, Role, Utterance};
pub use participant::{ParticipantKind, ParticipantProfile};
pub use verdict::Verdict;
