//! Integration tests for plan execution with stub workers

use super::common::*;
use launch_planner::planner::{execute_plan, PlanEvent, PlanExecutor, WorkerId};
use launch_planner::record::WorkerStatus;
use std::time::Duration;
use tokio::sync::mpsc;

fn all_succeed() -> Vec<(WorkerId, StubBehavior)> {
    WorkerId::all()
        .iter()
        .map(|id| (*id, StubBehavior::Succeed))
        .collect()
}

#[tokio::test]
async fn test_full_run_keeps_every_marker() {
    let (registry, counters) = stub_registry(&all_succeed());

    let record = execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("success"));
    for id in WorkerId::all() {
        assert_eq!(
            record.get_str(&marker_key(*id)),
            Some(format!("written by {}", id).as_str())
        );
        assert_eq!(record.worker_status(*id), Some(WorkerStatus::Success));
    }
    assert!(counters.iter().all(|c| calls(c) == 1));
}

#[tokio::test]
async fn test_only_planned_workers_run() {
    let (registry, counters) = stub_registry(&all_succeed());

    let goal = "What's the weather like and summarize the situation?";
    let record = execute_plan(goal, &registry).await;

    assert_eq!(record.status(), Some("success"));
    assert_eq!(calls(&counters[0]), 0);
    assert_eq!(calls(&counters[1]), 1);
    assert_eq!(calls(&counters[2]), 1);
    assert!(!record.contains_key(&marker_key(WorkerId::Lookup)));
}

#[tokio::test]
async fn test_unmatched_goal_runs_nothing() {
    let (registry, counters) = stub_registry(&all_succeed());

    let record = execute_plan("Book a flight.", &registry).await;

    assert_eq!(record.status(), Some("error"));
    assert_eq!(
        record.get_str("message"),
        Some("No workers identified for the goal.")
    );
    assert!(counters.iter().all(|c| calls(c) == 0));
}

#[tokio::test]
async fn test_worker_reported_error_halts_plan() {
    let (registry, counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Succeed),
        (WorkerId::Enrich, StubBehavior::ReportError),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);

    let record = execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("error_in_enrich"));
    assert_eq!(record.get_str("enrich_status"), Some("Error"));
    assert_eq!(record.get_str("enrich_error_message"), Some("Mock failure"));
    assert!(record.contains_key(&marker_key(WorkerId::Lookup)));

    assert_eq!(calls(&counters[0]), 1);
    assert_eq!(calls(&counters[1]), 1);
    assert_eq!(calls(&counters[2]), 0);
}

#[tokio::test]
async fn test_missing_worker_halts_and_keeps_progress() {
    let (registry, counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Succeed),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);

    let record = execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("error"));
    assert_eq!(
        record.get_str("planner_error"),
        Some("Worker 'enrich' not found in registry.")
    );
    assert_eq!(record.get_str("lookup_status"), Some("Success"));
    assert!(record.contains_key(&marker_key(WorkerId::Lookup)));
    assert_eq!(calls(&counters[1]), 0);
}

#[tokio::test]
async fn test_err_return_is_caught_as_fault() {
    let (registry, counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Fail),
        (WorkerId::Enrich, StubBehavior::Succeed),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);

    let record = execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("error"));
    assert_eq!(
        record.get_str("planner_error"),
        Some("Unexpected error during lookup execution: upstream exploded")
    );
    // Fields written before the fault stay
    assert_eq!(record.get_str(&marker_key(WorkerId::Lookup)), Some("partial"));
    assert_eq!(calls(&counters[1]), 0);
    assert_eq!(calls(&counters[2]), 0);
}

#[tokio::test]
async fn test_panic_is_caught_as_fault() {
    let (registry, counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Succeed),
        (WorkerId::Enrich, StubBehavior::Panic),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);

    let record = execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("error"));
    assert_eq!(
        record.get_str("planner_error"),
        Some("Unexpected error during enrich execution: stub worker panicked")
    );
    assert!(record.contains_key(&marker_key(WorkerId::Lookup)));
    assert_eq!(calls(&counters[2]), 0);
}

#[tokio::test]
async fn test_deadline_overrun_is_a_fault() {
    let (registry, counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Sleep(Duration::from_secs(5))),
        (WorkerId::Enrich, StubBehavior::Succeed),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);
    let executor = PlanExecutor::new().with_worker_timeout(Duration::from_millis(50));

    let record = executor.execute_plan(FULL_GOAL, &registry).await;

    assert_eq!(record.status(), Some("error"));
    assert_eq!(
        record.get_str("planner_error"),
        Some("Worker 'lookup' exceeded its 0.05s deadline")
    );
    assert_eq!(record.get_str(&marker_key(WorkerId::Lookup)), Some("before sleep"));
    assert!(!record.contains_key("lookup_status"));
    assert_eq!(calls(&counters[1]), 0);
}

#[tokio::test]
async fn test_slow_worker_within_deadline_succeeds() {
    let (registry, _counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::Sleep(Duration::from_millis(10))),
        (WorkerId::Enrich, StubBehavior::Succeed),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);
    let executor = PlanExecutor::new().with_worker_timeout(Duration::from_secs(5));

    let record = executor.execute_plan(FULL_GOAL, &registry).await;
    assert_eq!(record.status(), Some("success"));
}

#[tokio::test]
async fn test_runs_are_independent() {
    let (registry, counters) = stub_registry(&all_succeed());
    let executor = PlanExecutor::new();

    let first = executor.execute_plan("next launch", &registry).await;
    let second = executor.execute_plan("summary", &registry).await;

    assert!(first.contains_key(&marker_key(WorkerId::Lookup)));
    assert!(!second.contains_key(&marker_key(WorkerId::Lookup)));
    assert_eq!(second.status(), Some("success"));
    assert_eq!(calls(&counters[0]), 1);
    assert_eq!(calls(&counters[2]), 1);
}

#[tokio::test]
async fn test_events_for_successful_run() {
    let (registry, _counters) = stub_registry(&all_succeed());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = PlanExecutor::new().with_events(tx);

    executor.execute_plan("next launch summary", &registry).await;
    drop(executor);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 6);
    match &events[0] {
        PlanEvent::PlanCreated { workers, goal, .. } => {
            assert_eq!(workers, &vec![WorkerId::Lookup, WorkerId::Summarize]);
            assert_eq!(goal, "next launch summary");
        }
        other => panic!("unexpected first event: {:?}", other),
    }
    assert!(matches!(
        events[1],
        PlanEvent::WorkerStarted { worker: WorkerId::Lookup, .. }
    ));
    assert!(matches!(
        events[2],
        PlanEvent::WorkerCompleted {
            worker: WorkerId::Lookup,
            status: Some(WorkerStatus::Success),
            ..
        }
    ));
    assert!(matches!(
        events[3],
        PlanEvent::WorkerStarted { worker: WorkerId::Summarize, .. }
    ));
    assert!(matches!(events[5], PlanEvent::PlanCompleted { .. }));

    // Every event belongs to the same run
    let run_ids: Vec<&str> = events
        .iter()
        .map(|e| match e {
            PlanEvent::PlanCreated { run_id, .. }
            | PlanEvent::WorkerStarted { run_id, .. }
            | PlanEvent::WorkerCompleted { run_id, .. }
            | PlanEvent::PlanHalted { run_id, .. }
            | PlanEvent::PlanCompleted { run_id } => run_id.as_str(),
        })
        .collect();
    assert!(run_ids.iter().all(|id| *id == run_ids[0]));
    assert!(run_ids[0].starts_with("run-"));
}

#[tokio::test]
async fn test_events_for_halted_run() {
    let (registry, _counters) = stub_registry(&[
        (WorkerId::Lookup, StubBehavior::ReportError),
        (WorkerId::Summarize, StubBehavior::Succeed),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = PlanExecutor::new().with_events(tx);

    executor.execute_plan("next launch summary", &registry).await;
    drop(executor);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[2],
        PlanEvent::WorkerCompleted {
            status: Some(WorkerStatus::Error),
            ..
        }
    ));
    match &events[3] {
        PlanEvent::PlanHalted { reason, .. } => {
            assert_eq!(reason, "Worker 'lookup' reported an error. Halting plan.");
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_plan_emits_only_halt() {
    let (registry, _counters) = stub_registry(&all_succeed());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = PlanExecutor::new().with_events(tx);

    executor.execute_plan("hello", &registry).await;
    drop(executor);

    let event = rx.recv().await.unwrap();
    assert!(matches!(event, PlanEvent::PlanHalted { .. }));
    assert!(rx.recv().await.is_none());
}
