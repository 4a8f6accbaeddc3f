//! Client managing a conversation lifecycle against a remote agent service.
//!
//! Requests go out over HTTP; replies arrive asynchronously on a WebSocket
//! push channel maintained by a background listener task. The listener
//! stores the latest agent utterance into a single pending-response slot
//! which [`RemoteAgentClient::await_response`] polls, making the exchange
//! look synchronous to callers.
//!
//! Only one in-flight `send` per session is meaningful: a second send before
//! the response arrives overwrites the expectation. Callers are expected to
//! serialize sends; the orchestrator's one-speaker-per-iteration rule
//! already guarantees this.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Method;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::config::RemoteClientConfig;
use super::protocol::{
    Activity, ActivityReceipt, ActivitySet, ConversationInfo, ACTIVITY_MESSAGE, ACTIVITY_TYPING,
};
use super::session::{ChannelShared, ConnectionState, RemoteSessionSnapshot, SessionIds};
use crate::error::{ParleyError, Result};
use crate::secret::SecretProvider;
use crate::util::retry::{backoff_delay, RetryPolicy};
use crate::util::timeout::with_timeout;

/// Client for one remote agent, holding at most one live session.
pub struct RemoteAgentClient {
    agent_name: String,
    config: RemoteClientConfig,
    secrets: Arc<dyn SecretProvider>,
    http: reqwest::Client,
    credential: Mutex<Option<String>>,
    ids: Mutex<SessionIds>,
    channel: Arc<ChannelShared>,
    listener: tokio::sync::Mutex<Option<ListenerHandle>>,
}

struct ListenerHandle {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl RemoteAgentClient {
    pub fn new(
        agent_name: impl Into<String>,
        config: RemoteClientConfig,
        secrets: Arc<dyn SecretProvider>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ParleyError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            agent_name: agent_name.into(),
            config,
            secrets,
            http,
            credential: Mutex::new(None),
            ids: Mutex::new(SessionIds::default()),
            channel: Arc::new(ChannelShared::new()),
            listener: tokio::sync::Mutex::new(None),
        })
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn config(&self) -> &RemoteClientConfig {
        &self.config
    }

    /// Remote conversation id of the live session, if any.
    pub fn conversation_id(&self) -> Option<String> {
        self.ids.lock().unwrap().conversation_id.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Observable snapshot of the session.
    pub fn session(&self) -> RemoteSessionSnapshot {
        let ids = self.ids.lock().unwrap();
        RemoteSessionSnapshot {
            conversation_id: ids.conversation_id.clone(),
            stream_url: ids.stream_url.clone(),
            connection_state: self.channel.state(),
            reconnect_attempts: self.channel.reconnect_attempts(),
            has_pending_response: self.channel.has_pending_response(),
        }
    }

    /// Adopt a remote conversation id restored from persisted state.
    ///
    /// The push listener is re-established lazily on the next send.
    pub fn adopt_session(&self, conversation_id: impl Into<String>) {
        let mut ids = self.ids.lock().unwrap();
        ids.conversation_id = Some(conversation_id.into());
        ids.stream_url = None;
    }

    /// Start a new remote conversation and spawn the push listener.
    pub async fn start_session(&self) -> Result<String> {
        self.channel.set_state(ConnectionState::Connecting);
        let retry = RetryPolicy {
            max_attempts: self.config.max_retries,
            initial_backoff: self.config.retry_delay,
            max_backoff: self.config.reconnect_backoff_cap,
            multiplier: 2.0,
        };

        let info = match retry
            .execute(|| async {
                let response = self.request(Method::POST, "conversations", None).await?;
                response
                    .json::<ConversationInfo>()
                    .await
                    .map_err(ParleyError::from)
            })
            .await
        {
            Ok(info) => info,
            Err(e) => {
                self.channel.set_state(ConnectionState::Disconnected);
                return Err(connection_failure("starting conversation", e));
            }
        };

        {
            let mut ids = self.ids.lock().unwrap();
            ids.conversation_id = Some(info.conversation_id.clone());
            ids.stream_url = info.stream_url.clone();
        }
        tracing::info!(
            agent = %self.agent_name,
            conversation_id = %info.conversation_id,
            "conversation started"
        );

        match info.stream_url {
            Some(stream_url) => self.restart_listener(stream_url).await,
            None => tracing::warn!(
                agent = %self.agent_name,
                "no stream endpoint offered, pushed responses cannot be received"
            ),
        }

        Ok(info.conversation_id)
    }

    /// Post a message activity, starting or re-establishing the session as
    /// needed. Returns the correlation id assigned to the activity.
    ///
    /// A 401 invalidates the cached credential and retries once with a fresh
    /// one; transient failures are retried with exponential backoff up to
    /// `max_retries`; anything else is a permanent connection failure.
    pub async fn send(
        &self,
        text: &str,
        attachments: Vec<super::protocol::Attachment>,
        channel_data: Option<serde_json::Value>,
    ) -> Result<String> {
        let conversation_id = self.ensure_session().await?;

        let mut activity = Activity::message(&self.config.user_id, text);
        if !attachments.is_empty() {
            activity.attachments = Some(attachments);
        }
        activity.channel_data = channel_data;
        let path = format!("conversations/{conversation_id}/activities");
        let body = serde_json::to_value(&activity)?;

        let mut refreshed = false;
        let mut backoff = self.config.retry_delay;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.post_for_receipt(&path, &body).await {
                Ok(correlation) => return Ok(correlation),
                Err(ParleyError::Authentication(message)) => {
                    if refreshed {
                        return Err(ParleyError::Connection(format!(
                            "authentication rejected after credential refresh: {message}"
                        )));
                    }
                    tracing::warn!(
                        agent = %self.agent_name,
                        "credential rejected, refreshing and retrying"
                    );
                    self.invalidate_credential();
                    refreshed = true;
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    tracing::warn!(
                        agent = %self.agent_name,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "send failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.reconnect_backoff_cap);
                }
                Err(e) if e.is_retryable() => {
                    return Err(ParleyError::Connection(format!(
                        "send failed after {attempt} attempts: {e}"
                    )));
                }
                Err(e) => return Err(connection_failure("sending activity", e)),
            }
        }
    }

    /// Poll the pending-response slot until a pushed reply arrives or the
    /// deadline passes.
    ///
    /// A timeout is recoverable at the granularity of this turn, not the
    /// conversation. Dropping the future cancels the poll.
    pub async fn await_response(&self, timeout: Duration) -> Result<String> {
        with_timeout(timeout, async {
            loop {
                if let Some(text) = self.channel.take_response() {
                    return Ok(text);
                }
                tokio::time::sleep(self.config.response_poll_interval).await;
            }
        })
        .await
    }

    /// Best-effort remote teardown; local session state is always cleared,
    /// so a stale session id can never leak. Idempotent.
    pub async fn end_session(&self) {
        let conversation_id = self.ids.lock().unwrap().conversation_id.clone();
        if let Some(id) = conversation_id {
            let path = format!("conversations/{id}");
            match self.request(Method::DELETE, &path, None).await {
                Ok(_) => {
                    tracing::info!(agent = %self.agent_name, conversation_id = %id, "conversation ended");
                }
                Err(e) => {
                    tracing::warn!(
                        agent = %self.agent_name,
                        error = %e,
                        "best-effort conversation teardown failed"
                    );
                }
            }
        }

        if let Some(handle) = self.listener.lock().await.take() {
            handle.cancel.cancel();
            let abort = handle.task.abort_handle();
            if tokio::time::timeout(Duration::from_secs(5), handle.task)
                .await
                .is_err()
            {
                abort.abort();
                tracing::warn!(
                    agent = %self.agent_name,
                    "listener task aborted after shutdown timeout"
                );
            }
        }

        {
            let mut ids = self.ids.lock().unwrap();
            ids.conversation_id = None;
            ids.stream_url = None;
        }
        *self.credential.lock().unwrap() = None;
        self.channel.clear_response();
        self.channel.set_reconnect_attempts(0);
        self.channel.set_state(ConnectionState::Disconnected);
    }

    async fn ensure_session(&self) -> Result<String> {
        let existing = self.ids.lock().unwrap().conversation_id.clone();
        let Some(conversation_id) = existing else {
            return self.start_session().await;
        };

        let listener_alive = {
            let guard = self.listener.lock().await;
            guard
                .as_ref()
                .map(|handle| !handle.task.is_finished())
                .unwrap_or(false)
        };
        if !listener_alive {
            let path = format!("conversations/{conversation_id}");
            let response = self.request(Method::GET, &path, None).await?;
            let info: ConversationInfo = response.json().await.map_err(ParleyError::from)?;
            let Some(stream_url) = info.stream_url else {
                return Err(ParleyError::Connection(
                    "unable to obtain stream endpoint for reconnection".into(),
                ));
            };
            self.ids.lock().unwrap().stream_url = Some(stream_url.clone());
            self.restart_listener(stream_url).await;
            tracing::debug!(
                agent = %self.agent_name,
                conversation_id = %conversation_id,
                "push listener restarted"
            );
        }
        Ok(conversation_id)
    }

    async fn restart_listener(&self, stream_url: String) {
        let mut guard = self.listener.lock().await;
        if let Some(old) = guard.take() {
            old.cancel.cancel();
            old.task.abort();
        }
        let cancel = CancellationToken::new();
        let ctx = ListenerContext {
            agent_name: self.agent_name.clone(),
            stream_url,
            user_id: self.config.user_id.clone(),
            read_timeout: self.config.ws_ping_interval,
            base_backoff: self.config.retry_delay,
            backoff_cap: self.config.reconnect_backoff_cap,
            max_attempts: self.config.max_reconnect_attempts,
            channel: Arc::clone(&self.channel),
        };
        let task = tokio::spawn(run_listener(ctx, cancel.clone()));
        *guard = Some(ListenerHandle { task, cancel });
    }

    async fn post_for_receipt(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let response = self.request(Method::POST, path, Some(body)).await?;
        let receipt: ActivityReceipt = response
            .json()
            .await
            .unwrap_or(ActivityReceipt { id: None });
        Ok(receipt.id.unwrap_or_else(|| Uuid::new_v4().to_string()))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let credential = self.bearer_credential().await?;
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));
        let mut builder = self.http.request(method, url).bearer_auth(credential);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            Err(ParleyError::Authentication(message))
        } else {
            Err(ParleyError::api(status.as_u16(), message))
        }
    }

    async fn bearer_credential(&self) -> Result<String> {
        if let Some(credential) = self.credential.lock().unwrap().clone() {
            return Ok(credential);
        }
        let credential = self.secrets.get_secret(&self.config.secret_name).await?;
        *self.credential.lock().unwrap() = Some(credential.clone());
        Ok(credential)
    }

    fn invalidate_credential(&self) {
        *self.credential.lock().unwrap() = None;
    }
}

fn connection_failure(context: &str, e: ParleyError) -> ParleyError {
    match e {
        ParleyError::Authentication(_)
        | ParleyError::Configuration(_)
        | ParleyError::ContractViolation(_) => e,
        other => ParleyError::Connection(format!("{context}: {other}")),
    }
}

struct ListenerContext {
    agent_name: String,
    stream_url: String,
    user_id: String,
    read_timeout: Duration,
    base_backoff: Duration,
    backoff_cap: Duration,
    max_attempts: u32,
    channel: Arc<ChannelShared>,
}

enum ReadOutcome {
    ClosedNormally,
    Dropped,
    Cancelled,
}

/// Maintain the push channel: read frames into the pending slot, probe the
/// socket when idle, and reconnect with bounded exponential backoff when it
/// drops.
async fn run_listener(ctx: ListenerContext, cancel: CancellationToken) {
    let mut attempts: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        ctx.channel.set_state(ConnectionState::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio_tungstenite::connect_async(ctx.stream_url.as_str()) => result,
        };

        match connected {
            Ok((mut ws, _)) => {
                tracing::debug!(agent = %ctx.agent_name, "push channel established");
                ctx.channel.set_state(ConnectionState::Connected);
                attempts = 0;
                ctx.channel.set_reconnect_attempts(0);

                match read_frames(&mut ws, &ctx, &cancel).await {
                    ReadOutcome::ClosedNormally => {
                        tracing::debug!(agent = %ctx.agent_name, "push channel closed normally");
                        break;
                    }
                    ReadOutcome::Cancelled => break,
                    ReadOutcome::Dropped => ctx.channel.set_state(ConnectionState::Degraded),
                }
            }
            Err(e) => {
                tracing::warn!(agent = %ctx.agent_name, error = %e, "push channel connect failed");
            }
        }

        attempts += 1;
        ctx.channel.set_reconnect_attempts(attempts);
        if attempts >= ctx.max_attempts {
            tracing::error!(
                agent = %ctx.agent_name,
                attempts,
                "push channel permanently lost"
            );
            break;
        }

        let delay = backoff_delay(ctx.base_backoff, attempts, ctx.backoff_cap);
        tracing::info!(
            agent = %ctx.agent_name,
            delay_ms = delay.as_millis() as u64,
            "reconnecting push channel"
        );
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    ctx.channel.set_state(ConnectionState::Disconnected);
}

async fn read_frames(
    ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    ctx: &ListenerContext,
    cancel: &CancellationToken,
) -> ReadOutcome {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return ReadOutcome::Cancelled,
            next = tokio::time::timeout(ctx.read_timeout, ws.next()) => match next {
                Err(_) => {
                    // Idle: probe so half-open sockets are noticed.
                    if ws.send(WsMessage::Ping(Vec::new())).await.is_err() {
                        tracing::warn!(agent = %ctx.agent_name, "keepalive probe failed");
                        return ReadOutcome::Dropped;
                    }
                    tracing::debug!(agent = %ctx.agent_name, "keepalive probe sent");
                }
                Ok(None) => return ReadOutcome::Dropped,
                Ok(Some(Err(e))) => {
                    tracing::warn!(agent = %ctx.agent_name, error = %e, "push channel read failed");
                    return ReadOutcome::Dropped;
                }
                Ok(Some(Ok(message))) => match message {
                    WsMessage::Text(text) => handle_frame(&text, ctx),
                    WsMessage::Close(frame) => {
                        let normal = frame
                            .as_ref()
                            .map(|f| f.code == CloseCode::Normal)
                            .unwrap_or(false);
                        if normal {
                            return ReadOutcome::ClosedNormally;
                        }
                        tracing::warn!(agent = %ctx.agent_name, ?frame, "push channel closed abnormally");
                        return ReadOutcome::Dropped;
                    }
                    _ => {}
                }
            }
        }
    }
}

fn handle_frame(text: &str, ctx: &ListenerContext) {
    let set: ActivitySet = match serde_json::from_str(text) {
        Ok(set) => set,
        Err(e) => {
            tracing::error!(agent = %ctx.agent_name, error = %e, "failed to parse push frame");
            return;
        }
    };

    for activity in set.activities {
        match activity.kind.as_str() {
            ACTIVITY_MESSAGE => {
                if activity.from.id == ctx.user_id {
                    tracing::debug!(agent = %ctx.agent_name, "ignoring echoed activity");
                    continue;
                }
                match activity.text.filter(|t| !t.trim().is_empty()) {
                    Some(text) => ctx.channel.store_response(text),
                    None => tracing::debug!(agent = %ctx.agent_name, "message activity without text"),
                }
            }
            ACTIVITY_TYPING => {
                tracing::debug!(agent = %ctx.agent_name, "remote agent is typing");
            }
            other => {
                tracing::warn!(agent = %ctx.agent_name, kind = other, "unhandled activity type");
            }
        }
    }
}
