//! Remote client configuration.

use std::time::Duration;

use bon::Builder;

/// Configuration for [`RemoteAgentClient`](super::RemoteAgentClient).
///
/// Defaults mirror the remote service's documented operational envelope.
#[derive(Debug, Clone, Builder)]
pub struct RemoteClientConfig {
    /// Base URL of the conversation API.
    #[builder(into)]
    pub base_url: String,

    /// Name under which the [`SecretProvider`](crate::secret::SecretProvider)
    /// holds the service's bearer credential.
    #[builder(into)]
    pub secret_name: String,

    /// Identity stamped on outbound activities. Pushed frames carrying this
    /// identity are ignored (loop prevention).
    #[builder(into, default = "@client".to_string())]
    pub user_id: String,

    /// Maximum attempts for request operations (including the first).
    #[builder(default = 3)]
    pub max_retries: u32,

    /// Initial backoff between retries; doubles per attempt.
    #[builder(default = Duration::from_secs(1))]
    pub retry_delay: Duration,

    /// Deadline for HTTP requests and for awaiting a pushed response.
    #[builder(default = Duration::from_secs(120))]
    pub timeout: Duration,

    /// How many times the push listener tries to re-establish a dropped
    /// channel before giving up.
    #[builder(default = 3)]
    pub max_reconnect_attempts: u32,

    /// Idle read window after which the listener probes the channel with a
    /// keepalive ping.
    #[builder(default = Duration::from_secs(20))]
    pub ws_ping_interval: Duration,

    /// Upper bound on listener reconnect backoff.
    #[builder(default = Duration::from_secs(60))]
    pub reconnect_backoff_cap: Duration,

    /// Interval between polls of the pending-response slot.
    #[builder(default = Duration::from_millis(100))]
    pub response_poll_interval: Duration,
}
