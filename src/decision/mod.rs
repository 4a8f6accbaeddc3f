//! Decision functions: next-speaker selection and termination.
//!
//! Both strategies are opaque model-backed oracles with a narrow contract:
//! given a windowed history view they return a structured verdict, either a
//! participant name (selection) or `"yes"`/`"no"` (termination). The
//! judgment itself lives in the instructions the host supplies; the code
//! only enforces the contract around it.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{ModelRequest, ModelService, ResponseFormat};
use crate::types::{Message, Verdict};
use crate::util::retry::RetryPolicy;

const VERDICT_SCHEMA_NAME: &str = "chat_rule";

fn verdict_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        name: VERDICT_SCHEMA_NAME.to_string(),
        schema: Verdict::response_schema(),
    }
}

/// Chooses which participant speaks next.
pub struct SelectionStrategy {
    model: Arc<dyn ModelService>,
    instructions: String,
    retry: RetryPolicy,
}

impl SelectionStrategy {
    pub fn new(model: Arc<dyn ModelService>, instructions: impl Into<String>) -> Self {
        Self {
            model,
            instructions: instructions.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Choose the next speaker from `participants` given a history view.
    ///
    /// Verdicts are matched against participant names case-insensitively;
    /// out-of-vocabulary and unparseable verdicts coerce to the facilitator.
    /// Transport failures are retried; exhausting retries surfaces the error.
    pub async fn select(
        &self,
        view: &[Message],
        participants: &[String],
        facilitator: &str,
    ) -> Result<String> {
        let request = ModelRequest::builder()
            .instructions(self.instructions.clone())
            .messages(view.to_vec())
            .response_format(verdict_format())
            .build();

        let completion = self
            .retry
            .execute(|| async { self.model.complete(&request).await })
            .await?;

        let verdict = match Verdict::parse(&completion) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "selection verdict unparseable, defaulting to facilitator");
                return Ok(facilitator.to_string());
            }
        };

        tracing::debug!(verdict = %verdict.value, reasoning = %verdict.reasoning, "selection verdict");

        match participants
            .iter()
            .find(|name| name.eq_ignore_ascii_case(&verdict.value))
        {
            Some(name) => Ok(name.clone()),
            None => {
                tracing::debug!(
                    verdict = %verdict.value,
                    "selection verdict is not a participant, defaulting to facilitator"
                );
                Ok(facilitator.to_string())
            }
        }
    }
}

/// Decides whether the conversation should end.
pub struct TerminationStrategy {
    model: Arc<dyn ModelService>,
    instructions: String,
    retry: RetryPolicy,
}

impl TerminationStrategy {
    pub fn new(model: Arc<dyn ModelService>, instructions: impl Into<String>) -> Self {
        Self {
            model,
            instructions: instructions.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Decide whether the conversation should end, given a history view.
    ///
    /// Unlike selection there is no safe coercion here: parse failures and
    /// exhausted retries surface to the caller.
    pub async fn should_terminate(&self, view: &[Message]) -> Result<bool> {
        let request = ModelRequest::builder()
            .instructions(self.instructions.clone())
            .messages(view.to_vec())
            .response_format(verdict_format())
            .build();

        let completion = self
            .retry
            .execute(|| async { self.model.complete(&request).await })
            .await?;

        let verdict = Verdict::parse(&completion)?;
        tracing::debug!(verdict = %verdict.value, reasoning = %verdict.reasoning, "termination verdict");
        Ok(verdict.is_yes())
    }
}
