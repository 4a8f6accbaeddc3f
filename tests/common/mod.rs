//! Shared test doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use parley::error::{ParleyError, Result};
use parley::model::{ModelRequest, ModelService};
use parley::participant::AgentProxy;
use parley::types::{ConversationHistory, Utterance};

/// Model service that replays queued responses and records requests.
///
/// When the queue is empty it answers with a `"no"` termination verdict so
/// loops under test keep running.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_verdict(&self, value: &str, reasoning: &str) {
        self.push_text(
            serde_json::json!({ "verdict": value, "reasoning": reasoning }).to_string(),
        );
    }

    pub fn push_error(&self, error: ParleyError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"verdict": "no", "reasoning": "default"}"#.to_string()))
    }
}

/// Participant that replays queued turns and counts invocations.
pub struct ScriptedAgent {
    name: String,
    replies: Mutex<VecDeque<Result<Vec<Utterance>>>>,
    invocations: AtomicUsize,
}

impl ScriptedAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn push_text(&self, text: impl Into<String>) {
        let utterance = Utterance::assistant(&self.name, text);
        self.replies.lock().unwrap().push_back(Ok(vec![utterance]));
    }

    pub fn push_silence(&self) {
        self.replies.lock().unwrap().push_back(Ok(Vec::new()));
    }

    pub fn push_utterances(&self, utterances: Vec<Utterance>) {
        self.replies.lock().unwrap().push_back(Ok(utterances));
    }

    pub fn push_error(&self, error: ParleyError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentProxy for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, _history: &ConversationHistory) -> Result<Vec<Utterance>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(vec![Utterance::assistant(
                &self.name,
                format!("{} speaking", self.name),
            )])
        })
    }
}
