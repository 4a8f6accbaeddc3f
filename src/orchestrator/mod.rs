//! Turn orchestration: who speaks next, and when the conversation ends.

use std::sync::Arc;

use async_stream::try_stream;
use bon::Builder;
use futures::Stream;
use strum::Display;

use crate::decision::{SelectionStrategy, TerminationStrategy};
use crate::error::{ParleyError, Result};
use crate::participant::AgentProxy;
use crate::types::{ConversationHistory, Message, ParticipantProfile};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The facilitator's termination verdict ended the conversation.
    Terminated,
    /// The iteration cap was reached without a termination verdict.
    IterationLimit,
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone, Builder)]
pub struct OrchestratorConfig {
    /// Upper bound on participant turns per run.
    #[builder(default = 30)]
    pub max_iterations: usize,

    /// History view size for selection calls. Termination always sees only
    /// the last message.
    #[builder(default = 20)]
    pub selection_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            selection_window: 20,
        }
    }
}

/// One registered participant: profile plus responder.
pub struct Participant {
    pub profile: ParticipantProfile,
    pub proxy: Arc<dyn AgentProxy>,
}

impl Participant {
    pub fn new(profile: ParticipantProfile, proxy: Arc<dyn AgentProxy>) -> Self {
        Self { profile, proxy }
    }
}

/// Drives the conversation loop.
///
/// One active turn per conversation id is a host precondition (the
/// surrounding transport guarantees it); one run per orchestrator is
/// enforced by the `&mut self` borrow on [`Self::invoke`].
pub struct TurnOrchestrator {
    participants: Vec<Participant>,
    facilitator: usize,
    selection: SelectionStrategy,
    termination: TerminationStrategy,
    history: ConversationHistory,
    config: OrchestratorConfig,
    stop_reason: Option<StopReason>,
}

impl TurnOrchestrator {
    /// Build an orchestrator over a participant set.
    ///
    /// Participant names must be unique and exactly one participant must be
    /// the facilitator.
    pub fn new(
        participants: Vec<Participant>,
        selection: SelectionStrategy,
        termination: TerminationStrategy,
        history: ConversationHistory,
    ) -> Result<Self> {
        let facilitators: Vec<usize> = participants
            .iter()
            .enumerate()
            .filter(|(_, p)| p.profile.facilitator)
            .map(|(i, _)| i)
            .collect();
        let facilitator = match facilitators.as_slice() {
            [index] => *index,
            [] => {
                return Err(ParleyError::Configuration(
                    "no facilitator among participants".into(),
                ))
            }
            _ => {
                return Err(ParleyError::Configuration(
                    "more than one facilitator among participants".into(),
                ))
            }
        };

        for (i, participant) in participants.iter().enumerate() {
            let name = &participant.profile.name;
            if participants[..i]
                .iter()
                .any(|other| other.profile.name.eq_ignore_ascii_case(name))
            {
                return Err(ParleyError::Configuration(format!(
                    "duplicate participant name: {name}"
                )));
            }
        }

        Ok(Self {
            participants,
            facilitator,
            selection,
            termination,
            history,
            config: OrchestratorConfig::default(),
            stop_reason: None,
        })
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Take the history back, consuming the orchestrator.
    pub fn into_history(self) -> ConversationHistory {
        self.history
    }

    /// Why the last completed run stopped. `None` while a run is in flight
    /// or when the consumer stopped early.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    fn participant_index(&self, name: &str) -> usize {
        self.participants
            .iter()
            .position(|p| p.profile.name.eq_ignore_ascii_case(name))
            .unwrap_or(self.facilitator)
    }

    /// Drive the conversation until termination or the iteration cap.
    ///
    /// Messages are yielded in speaking order, immediately after each is
    /// appended to the history. The caller may stop consuming early by
    /// dropping the stream.
    pub fn invoke(&mut self) -> impl Stream<Item = Result<Message>> + Send + '_ {
        try_stream! {
            self.stop_reason = None;
            let names: Vec<String> = self
                .participants
                .iter()
                .map(|p| p.profile.name.clone())
                .collect();
            let facilitator_name = self.participants[self.facilitator].profile.name.clone();

            // Bootstrap rule: on an empty history the facilitator speaks
            // first, skipping an ambiguous first selection call.
            let mut forced_speaker = self.history.is_empty().then_some(self.facilitator);

            let mut terminated = false;
            for iteration in 0..self.config.max_iterations {
                let speaker = match forced_speaker.take() {
                    Some(index) => index,
                    None => {
                        let view = self.history.window(self.config.selection_window).to_vec();
                        let name = self
                            .selection
                            .select(&view, &names, &facilitator_name)
                            .await?;
                        self.participant_index(&name)
                    }
                };
                let speaker_name = self.participants[speaker].profile.name.clone();
                tracing::debug!(iteration, speaker = %speaker_name, "turn selected");

                let outputs = match self.participants[speaker].proxy.respond(&self.history).await {
                    Ok(outputs) => outputs,
                    Err(e) if e.is_turn_recoverable() => {
                        tracing::warn!(
                            participant = %speaker_name,
                            error = %e,
                            "participant failed this turn, continuing without output"
                        );
                        Vec::new()
                    }
                    Err(e) => Err(e)?,
                };

                for utterance in outputs {
                    if utterance.is_blank() {
                        // a participant may legitimately emit nothing
                        continue;
                    }
                    let message = self.history.append(utterance).clone();
                    yield message;
                }

                // Only the facilitator's termination opinion is
                // authoritative; after anyone else speaks the loop simply
                // continues.
                if self.participants[speaker].profile.facilitator && !self.history.is_empty() {
                    let view = self.history.window(1).to_vec();
                    if self.termination.should_terminate(&view).await? {
                        tracing::info!(iteration, "conversation terminated by facilitator verdict");
                        self.stop_reason = Some(StopReason::Terminated);
                        terminated = true;
                        break;
                    }
                }
            }

            if !terminated {
                tracing::info!(
                    max_iterations = self.config.max_iterations,
                    "iteration cap reached without termination"
                );
                self.stop_reason = Some(StopReason::IterationLimit);
            }
        }
    }
}
