//! Tests for the turn orchestration loop.

mod common;

use std::sync::Arc;

use common::{ScriptedAgent, ScriptedModel};
use futures::StreamExt;
use pretty_assertions::assert_eq;

use parley::decision::{SelectionStrategy, TerminationStrategy};
use parley::error::ParleyError;
use parley::orchestrator::{OrchestratorConfig, Participant, StopReason, TurnOrchestrator};
use parley::types::{ConversationHistory, ParticipantKind, ParticipantProfile, Role};

struct Fixture {
    selection_model: Arc<ScriptedModel>,
    termination_model: Arc<ScriptedModel>,
    facilitator: Arc<ScriptedAgent>,
    specialist: Arc<ScriptedAgent>,
    orchestrator: TurnOrchestrator,
}

/// Two participants: facilitator "Orchestrator" and specialist "Radiology".
fn fixture(history: ConversationHistory) -> Fixture {
    let selection_model = Arc::new(ScriptedModel::new());
    let termination_model = Arc::new(ScriptedModel::new());
    let facilitator = Arc::new(ScriptedAgent::new("Orchestrator"));
    let specialist = Arc::new(ScriptedAgent::new("Radiology"));

    let participants = vec![
        Participant::new(
            ParticipantProfile::facilitator("Orchestrator", ParticipantKind::Local),
            facilitator.clone(),
        ),
        Participant::new(
            ParticipantProfile::new("Radiology", ParticipantKind::Local),
            specialist.clone(),
        ),
    ];
    let orchestrator = TurnOrchestrator::new(
        participants,
        SelectionStrategy::new(selection_model.clone(), "pick the next speaker"),
        TerminationStrategy::new(termination_model.clone(), "should the conversation end?"),
        history,
    )
    .unwrap();

    Fixture {
        selection_model,
        termination_model,
        facilitator,
        specialist,
        orchestrator,
    }
}

#[tokio::test]
async fn facilitator_speaks_first_on_empty_history() {
    let mut fx = fixture(ConversationHistory::new());
    fx.facilitator
        .push_text("Here is the plan. *Radiology*, please proceed.");
    fx.termination_model.push_verdict("no", "handed off");
    // lowercase verdict still resolves to the registered participant
    fx.selection_model.push_verdict("radiology", "was addressed");
    fx.specialist.push_text("Findings: no acute disease.");
    fx.selection_model.push_verdict("Orchestrator", "back to facilitator");
    fx.facilitator.push_text("Anything else?");
    fx.termination_model.push_verdict("yes", "question to the user");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].author.as_deref(), Some("Orchestrator"));
    assert_eq!(messages[1].author.as_deref(), Some("Radiology"));
    assert_eq!(messages[2].author.as_deref(), Some("Orchestrator"));
    // no selection call was made for the bootstrap turn
    assert_eq!(fx.selection_model.request_count(), 2);
    assert_eq!(fx.orchestrator.stop_reason(), Some(StopReason::Terminated));
}

#[tokio::test]
async fn yielded_ordinals_are_strictly_increasing_and_match_history() {
    let mut fx = fixture(ConversationHistory::new());
    fx.facilitator.push_text("one");
    fx.termination_model.push_verdict("no", "");
    fx.selection_model.push_verdict("Radiology", "");
    fx.specialist.push_text("two");
    fx.selection_model.push_verdict("Orchestrator", "");
    fx.facilitator.push_text("three");
    fx.termination_model.push_verdict("yes", "");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    let yielded: Vec<u64> = messages.iter().map(|m| m.ordinal).collect();
    assert_eq!(yielded, vec![0, 1, 2]);
    let appended: Vec<u64> = fx
        .orchestrator
        .history()
        .messages()
        .iter()
        .map(|m| m.ordinal)
        .collect();
    assert_eq!(yielded, appended);
}

#[tokio::test]
async fn unknown_selection_verdict_defaults_to_facilitator() {
    let mut history = ConversationHistory::new();
    history.add_user_message("please continue");
    let mut fx = fixture(history);

    fx.selection_model.push_verdict("Cardiology", "not in this conversation");
    fx.facilitator.push_text("Taking this one.");
    fx.termination_model.push_verdict("yes", "");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author.as_deref(), Some("Orchestrator"));
    assert_eq!(fx.specialist.invocations(), 0);
}

#[tokio::test]
async fn termination_is_consulted_only_after_facilitator_turns() {
    let mut history = ConversationHistory::new();
    history.add_user_message("radiology, what do you see?");
    let mut fx = fixture(history);

    fx.selection_model.push_verdict("Radiology", "was addressed");
    fx.specialist.push_text("Bilateral infiltrates.");
    // no termination call happens here even though the turn completed
    fx.selection_model.push_verdict("Orchestrator", "default");
    fx.facilitator.push_text("Summarizing for the user.");
    fx.termination_model.push_verdict("yes", "");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 2);
    assert_eq!(fx.termination_model.request_count(), 1);
}

#[tokio::test]
async fn iteration_cap_stops_the_loop_without_error() {
    let mut history = ConversationHistory::new();
    history.add_user_message("keep going");
    let mut fx = fixture(history);
    // scripts exhausted: selection defaults to "no"-shaped verdict, which is
    // not a participant name, so the facilitator speaks every iteration and
    // termination keeps answering "no"

    fx.orchestrator = fx.orchestrator.with_config(
        OrchestratorConfig::builder()
            .max_iterations(30)
            .selection_window(5)
            .build(),
    );

    let results: Vec<_> = fx.orchestrator.invoke().collect().await;

    assert_eq!(results.len(), 30);
    assert!(results.iter().all(|item| item.is_ok()));
    assert_eq!(fx.facilitator.invocations(), 30);
    assert_eq!(
        fx.orchestrator.stop_reason(),
        Some(StopReason::IterationLimit)
    );
}

#[tokio::test]
async fn exactly_one_participant_speaks_per_iteration() {
    let mut history = ConversationHistory::new();
    history.add_user_message("start");
    let mut fx = fixture(history);

    fx.selection_model.push_verdict("Radiology", "");
    fx.specialist.push_text("first");
    fx.selection_model.push_verdict("Radiology", "");
    fx.specialist.push_text("second");
    fx.selection_model.push_verdict("Orchestrator", "");
    fx.facilitator.push_text("done");
    fx.termination_model.push_verdict("yes", "");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    // one selection call per non-bootstrap iteration, one speaker each
    assert_eq!(fx.selection_model.request_count(), 3);
    assert_eq!(messages.len(), 3);
    assert_eq!(fx.specialist.invocations(), 2);
    assert_eq!(fx.facilitator.invocations(), 1);
}

#[tokio::test]
async fn connection_failure_skips_the_turn_and_continues() {
    let mut history = ConversationHistory::new();
    history.add_user_message("radiology?");
    let mut fx = fixture(history);

    fx.selection_model.push_verdict("Radiology", "");
    fx.specialist
        .push_error(ParleyError::Connection("remote unreachable".into()));
    fx.selection_model.push_verdict("Orchestrator", "");
    fx.facilitator.push_text("Radiology is unavailable right now.");
    fx.termination_model.push_verdict("yes", "");

    let results: Vec<_> = fx.orchestrator.invoke().collect().await;

    assert_eq!(results.len(), 1);
    let message = results[0].as_ref().unwrap();
    assert_eq!(message.author.as_deref(), Some("Orchestrator"));
}

#[tokio::test]
async fn termination_decision_failure_ends_the_run_with_an_error() {
    let mut fx = fixture(ConversationHistory::new());
    fx.facilitator.push_text("hello");
    fx.termination_model.push_text("not json at all");

    let results: Vec<_> = fx.orchestrator.invoke().collect().await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ParleyError::Decision(_))));
}

#[tokio::test]
async fn blank_outputs_are_skipped_silently() {
    let mut history = ConversationHistory::new();
    history.add_user_message("anyone?");
    let mut fx = fixture(history);

    fx.selection_model.push_verdict("Radiology", "");
    fx.specialist.push_utterances(vec![parley::types::Utterance::assistant(
        "Radiology",
        "   ",
    )]);
    fx.selection_model.push_verdict("Orchestrator", "");
    fx.facilitator.push_text("nothing from radiology");
    fx.termination_model.push_verdict("yes", "");

    let messages: Vec<_> = fx
        .orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 1);
    assert_eq!(fx.orchestrator.history().len(), 2);
}

#[tokio::test]
async fn termination_sees_only_the_last_message() {
    let mut fx = fixture(ConversationHistory::new());
    fx.facilitator.push_text("final answer");
    fx.termination_model.push_verdict("yes", "");

    let _: Vec<_> = fx.orchestrator.invoke().collect().await;

    let requests = fx.termination_model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].messages[0].content, "final answer");
}

#[tokio::test]
async fn user_messages_keep_their_role_in_history() {
    let mut history = ConversationHistory::new();
    let message = history.add_user_message("hello all");
    assert_eq!(message.role, Role::User);

    let fx = fixture(history);
    assert_eq!(fx.orchestrator.history().len(), 1);
}

#[tokio::test]
async fn construction_rejects_missing_facilitator() {
    let model = Arc::new(ScriptedModel::new());
    let agent = Arc::new(ScriptedAgent::new("solo"));
    let result = TurnOrchestrator::new(
        vec![Participant::new(
            ParticipantProfile::new("solo", ParticipantKind::Local),
            agent,
        )],
        SelectionStrategy::new(model.clone(), ""),
        TerminationStrategy::new(model, ""),
        ConversationHistory::new(),
    );
    assert!(matches!(result, Err(ParleyError::Configuration(_))));
}
