//! Participant descriptors.

use serde::{Deserialize, Serialize};

/// How a participant produces its responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    /// In-process, model-backed responder.
    Local,
    /// Proxied to a remote agent service.
    Remote,
    /// A human reached through the input bridge.
    Human,
}

/// Static description of one conversation participant.
///
/// Names are unique within a conversation. Exactly one participant per
/// conversation is the facilitator: the default speaker and the sole
/// authority for termination verdicts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantProfile {
    pub name: String,
    pub kind: ParticipantKind,
    pub facilitator: bool,
}

impl ParticipantProfile {
    pub fn new(name: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            name: name.into(),
            kind,
            facilitator: false,
        }
    }

    /// Create a facilitator profile.
    pub fn facilitator(name: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            name: name.into(),
            kind,
            facilitator: true,
        }
    }
}
