//! Remote session state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Connection state of the push channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
}

/// Observable snapshot of a remote session.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSessionSnapshot {
    pub conversation_id: Option<String>,
    pub stream_url: Option<String>,
    pub connection_state: ConnectionState,
    pub reconnect_attempts: u32,
    pub has_pending_response: bool,
}

/// Identifiers of the live remote conversation.
#[derive(Debug, Default)]
pub(crate) struct SessionIds {
    pub conversation_id: Option<String>,
    pub stream_url: Option<String>,
}

/// State shared between the client and its listener task.
///
/// The pending-response slot is a single atomically swapped value: the
/// listener is its only writer, the awaiting caller its only consumer, and
/// the last value wins; replies never stack.
#[derive(Debug)]
pub(crate) struct ChannelShared {
    state: Mutex<ConnectionState>,
    pending: Mutex<Option<String>>,
    reconnect_attempts: AtomicU32,
}

impl ChannelShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            pending: Mutex::new(None),
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn store_response(&self, text: String) {
        *self.pending.lock().unwrap() = Some(text);
    }

    pub fn take_response(&self) -> Option<String> {
        self.pending.lock().unwrap().take()
    }

    pub fn has_pending_response(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    pub fn clear_response(&self) {
        *self.pending.lock().unwrap() = None;
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn set_reconnect_attempts(&self, attempts: u32) {
        self.reconnect_attempts.store(attempts, Ordering::Relaxed);
    }
}
