//! Query Coordinator Tests
//!
//! Timer-driven lifecycle behavior, run on a paused clock:
//! - Bursts of changes collapse into one execution
//! - A slow response never overwrites a newer one
//! - Requests without rules are never executed

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{duration_request, echoed, settled, RecordingService};
use querylens::executor::{CoordinatorSettings, QueryCoordinator, QueryStatus};
use querylens::filter::{FilterGroup, FilterRule};
use querylens::request::VisualizerQueryRequest;
use querylens::schema::Operator;
use serde_json::json;

fn coordinator(service: &Arc<RecordingService>) -> QueryCoordinator {
    QueryCoordinator::new(service.clone(), CoordinatorSettings::default())
}

// =============================================================================
// Debounce
// =============================================================================

/// Ten edits 100ms apart produce one execution of the last request.
#[tokio::test(start_paused = true)]
async fn test_debounce_collapses_burst() {
    let service = RecordingService::new(50);
    let coordinator = coordinator(&service);
    let mut rx = coordinator.subscribe();

    for value in 1..=10 {
        coordinator.submit(duration_request(value));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(service.executions(), 0);

    let snapshot = settled(&mut rx).await;
    assert_eq!(service.executions(), 1);
    assert_eq!(echoed(&snapshot), json!(10));
    let executed = service.executed();
    let rule = executed[0].filters.rules[0].as_rule().unwrap();
    assert_eq!(rule.value, json!(10));

    let metrics = coordinator.metrics();
    assert_eq!(metrics.debounce_restarts, 9);
    assert_eq!(metrics.executions, 1);
}

/// Edits separated by more than the window execute separately.
#[tokio::test(start_paused = true)]
async fn test_settled_edits_execute_separately() {
    let service = RecordingService::new(50);
    let coordinator = coordinator(&service);
    let mut rx = coordinator.subscribe();

    coordinator.submit(duration_request(1));
    settled(&mut rx).await;
    coordinator.submit(duration_request(2));
    let snapshot = settled(&mut rx).await;

    assert_eq!(service.executions(), 2);
    assert_eq!(echoed(&snapshot), json!(2));
}

/// The window is taken from the settings.
#[tokio::test(start_paused = true)]
async fn test_custom_debounce_window() {
    let service = RecordingService::new(10);
    let coordinator = QueryCoordinator::new(
        service.clone(),
        CoordinatorSettings {
            debounce: Duration::from_millis(200),
            ..CoordinatorSettings::default()
        },
    );

    coordinator.submit(duration_request(1));
    tokio::time::sleep(Duration::from_millis(199)).await;
    assert_eq!(service.executions(), 0);
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(service.executions(), 1);
}

// =============================================================================
// Out-of-order responses
// =============================================================================

/// A is in flight when B commits; A resolves after B. B stays applied.
#[tokio::test(start_paused = true)]
async fn test_stale_response_does_not_overwrite_newer() {
    let service = RecordingService::new(10);
    service.queue_delays(&[5_000, 100]);
    let coordinator = coordinator(&service);
    let mut rx = coordinator.subscribe();

    coordinator.submit(duration_request(1));
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(service.executions(), 1);

    coordinator.submit(duration_request(2));
    let snapshot = settled(&mut rx).await;
    assert_eq!(echoed(&snapshot), json!(2));

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert_eq!(echoed(&snapshot), json!(2));
    assert_eq!(coordinator.metrics().superseded, 1);
}

/// A resolves while B is still debouncing; it is not applied.
#[tokio::test(start_paused = true)]
async fn test_response_for_replaced_request_is_dropped() {
    let service = RecordingService::new(10);
    service.queue_delays(&[300, 300]);
    let coordinator = coordinator(&service);

    coordinator.submit(duration_request(1));
    tokio::time::sleep(Duration::from_millis(700)).await;
    coordinator.submit(duration_request(2));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.status, QueryStatus::Debouncing);
    assert!(snapshot.last_good().is_none());
}

// =============================================================================
// Gating
// =============================================================================

fn unfiltered_request() -> VisualizerQueryRequest {
    VisualizerQueryRequest {
        filters: FilterGroup::empty(),
        group_by: vec!["status".into()],
        aggregations: vec![],
        sort: vec![],
        limit: 1000,
        include_join_hint: None,
    }
}

/// An empty filter root never executes, whatever else is requested.
#[tokio::test(start_paused = true)]
async fn test_empty_root_never_executes() {
    let service = RecordingService::new(10);
    let coordinator = coordinator(&service);

    coordinator.submit(unfiltered_request());
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(service.executions(), 0);
    assert_eq!(coordinator.snapshot().status, QueryStatus::Idle);
    assert_eq!(coordinator.metrics().gated, 1);
}

/// Clearing the filters cancels a pending commit and drops the data.
#[tokio::test(start_paused = true)]
async fn test_gating_cancels_pending_commit() {
    let service = RecordingService::new(10);
    let coordinator = coordinator(&service);
    let mut rx = coordinator.subscribe();

    coordinator.submit(duration_request(1));
    settled(&mut rx).await;

    coordinator.submit(duration_request(2));
    tokio::time::sleep(Duration::from_millis(300)).await;
    coordinator.submit(unfiltered_request());
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = coordinator.snapshot();
    assert_eq!(service.executions(), 1);
    assert_eq!(snapshot.status, QueryStatus::Idle);
    assert!(snapshot.data.is_none());
}

/// A nested group holding the only rule is enough to execute.
#[tokio::test(start_paused = true)]
async fn test_nested_rule_is_executable() {
    let service = RecordingService::new(10);
    let coordinator = coordinator(&service);
    let mut rx = coordinator.subscribe();

    let mut request = unfiltered_request();
    request.filters = FilterGroup::empty().with_child(
        FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::Eq, json!("missed")).into())
            .into(),
    );
    coordinator.submit(request);
    let snapshot = settled(&mut rx).await;

    assert_eq!(service.executions(), 1);
    assert_eq!(snapshot.status, QueryStatus::Success);
}
