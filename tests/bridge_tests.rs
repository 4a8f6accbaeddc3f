//! Tests for the human-in-the-loop rendezvous bridge.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use parley::bridge::{BridgeConfig, HitlBridge, SlotStore};
use parley::error::ParleyError;
use parley::store::{FsSlotStore, MemorySlotStore};

fn memory_bridge() -> Arc<HitlBridge> {
    Arc::new(HitlBridge::new(Arc::new(MemorySlotStore::new())))
}

#[tokio::test(start_paused = true)]
async fn input_provided_from_another_task_resumes_the_request() {
    let bridge = memory_bridge();
    let cancel = CancellationToken::new();

    let waiter = {
        let bridge = bridge.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.request_input("conv1", "Continue?", &cancel).await })
    };

    let provider = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            bridge.provide_input("conv1", "yes").await.unwrap();
        })
    };

    provider.await.unwrap();
    let answer = waiter.await.unwrap().unwrap();
    assert_eq!(answer, "yes");

    // the slot was consumed
    assert!(!bridge.is_awaiting("conv1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn second_request_while_pending_is_a_contract_violation() {
    let bridge = memory_bridge();
    let cancel = CancellationToken::new();

    let waiter = {
        let bridge = bridge.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.request_input("conv1", "first", &cancel).await })
    };
    tokio::task::yield_now().await;
    assert!(bridge.is_awaiting("conv1").await.unwrap());

    let second = bridge.request_input("conv1", "second", &cancel).await;
    assert!(matches!(second, Err(ParleyError::ContractViolation(_))));

    cancel.cancel();
    let first = waiter.await.unwrap();
    assert!(matches!(first, Err(ParleyError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn late_arriving_input_is_consumed_by_the_next_request() {
    let bridge = memory_bridge();
    let cancel = CancellationToken::new();

    bridge.provide_input("conv1", "early answer").await.unwrap();
    // no run was waiting, so nothing is awaiting input
    assert!(!bridge.is_awaiting("conv1").await.unwrap());

    let answer = bridge
        .request_input("conv1", "prompt", &cancel)
        .await
        .unwrap();
    assert_eq!(answer, "early answer");
}

#[tokio::test(start_paused = true)]
async fn clearing_the_conversation_aborts_a_suspended_request() {
    let bridge = memory_bridge();
    let cancel = CancellationToken::new();

    let waiter = {
        let bridge = bridge.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.request_input("conv1", "prompt", &cancel).await })
    };
    tokio::task::yield_now().await;
    bridge.clear("conv1").await.unwrap();

    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(ParleyError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn cancellation_token_aborts_the_wait() {
    let bridge = memory_bridge();
    let cancel = CancellationToken::new();

    let waiter = {
        let bridge = bridge.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.request_input("conv1", "prompt", &cancel).await })
    };
    tokio::task::yield_now().await;
    cancel.cancel();

    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(ParleyError::Cancelled)));
    // the stale slot is still there until the conversation is cleared
    bridge.clear("conv1").await.unwrap();
    assert!(!bridge.is_awaiting("conv1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn poll_interval_is_configurable() {
    let store = Arc::new(MemorySlotStore::new());
    let bridge = Arc::new(HitlBridge::with_config(
        store,
        BridgeConfig::builder()
            .poll_interval(Duration::from_millis(50))
            .build(),
    ));
    let cancel = CancellationToken::new();

    let waiter = {
        let bridge = bridge.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.request_input("conv1", "prompt", &cancel).await })
    };
    tokio::task::yield_now().await;
    bridge.provide_input("conv1", "fast").await.unwrap();

    let started = tokio::time::Instant::now();
    let answer = waiter.await.unwrap().unwrap();
    assert_eq!(answer, "fast");
    assert!(started.elapsed() <= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn autonomous_run_suspends_on_the_bridge_and_resumes() {
    use common::{ScriptedAgent, ScriptedModel};
    use futures::StreamExt;
    use parley::decision::{SelectionStrategy, TerminationStrategy};
    use parley::orchestrator::{Participant, TurnOrchestrator};
    use parley::participant::HumanParticipant;
    use parley::types::{ConversationHistory, ParticipantKind, ParticipantProfile, Role};

    let bridge = memory_bridge();
    let selection_model = Arc::new(ScriptedModel::new());
    let termination_model = Arc::new(ScriptedModel::new());
    let facilitator = Arc::new(ScriptedAgent::new("Orchestrator"));

    facilitator.push_text("User, should we proceed with the report?");
    termination_model.push_verdict("no", "waiting on the user");
    selection_model.push_verdict("user", "question addressed to the user");
    selection_model.push_verdict("Orchestrator", "user answered");
    facilitator.push_text("Proceeding. Anything else?");
    termination_model.push_verdict("yes", "");

    let participants = vec![
        Participant::new(
            ParticipantProfile::facilitator("Orchestrator", ParticipantKind::Local),
            facilitator,
        ),
        Participant::new(
            ParticipantProfile::new("user", ParticipantKind::Human),
            Arc::new(HumanParticipant::new("user", "conv1", bridge.clone())),
        ),
    ];
    let mut orchestrator = TurnOrchestrator::new(
        participants,
        SelectionStrategy::new(selection_model, "pick"),
        TerminationStrategy::new(termination_model, "stop?"),
        ConversationHistory::new(),
    )
    .unwrap();

    // companion "inbound request" answering once the run is suspended
    let answerer = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            while !bridge.is_awaiting("conv1").await.unwrap() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            bridge.provide_input("conv1", "yes, go ahead").await.unwrap();
        })
    };

    let messages: Vec<_> = orchestrator
        .invoke()
        .map(|item| item.unwrap())
        .collect()
        .await;
    answerer.await.unwrap();

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].author.as_deref(), Some("user"));
    assert_eq!(messages[1].content, "yes, go ahead");
}

#[tokio::test]
async fn filesystem_slots_survive_across_bridge_instances() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();

    // one "process" deposits the answer
    {
        let bridge = HitlBridge::new(Arc::new(FsSlotStore::new(dir.path())));
        bridge.provide_input("conv1", "persisted").await.unwrap();
    }

    // another picks it up
    let bridge = HitlBridge::new(Arc::new(FsSlotStore::new(dir.path())));
    let answer = bridge
        .request_input("conv1", "prompt", &cancel)
        .await
        .unwrap();
    assert_eq!(answer, "persisted");

    let store = FsSlotStore::new(dir.path());
    assert_eq!(store.load("conv1").await.unwrap(), None);
}
