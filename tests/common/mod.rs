//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use querylens::executor::{
    ExecutionError, ExecutionResult, QueryService, QuerySnapshot, ServiceFuture,
};
use querylens::filter::{FilterGroup, FilterRule};
use querylens::request::{VisualizerQueryRequest, VisualizerQueryResult};
use querylens::schema::{FieldDefinition, FieldSource, FieldType, Operator, VisualizerSchema};
use serde_json::{json, Value};
use tokio::sync::watch;

// =============================================================================
// Schema
// =============================================================================

pub fn call_schema() -> VisualizerSchema {
    VisualizerSchema::new(vec![
        FieldDefinition::new("status", FieldType::Enum)
            .with_label("Call status")
            .with_enum_values(vec!["answered".into(), "missed".into(), "voicemail".into()]),
        FieldDefinition::new("duration", FieldType::Numeric).with_label("Duration (s)"),
        FieldDefinition::new("started_at", FieldType::Timestamp).with_label("Started"),
        FieldDefinition::new("caller.region", FieldType::Text)
            .with_label("Caller region")
            .with_source(FieldSource::Caller),
        FieldDefinition::new("campaign.active", FieldType::Boolean)
            .with_source(FieldSource::Campaign),
    ])
}

// =============================================================================
// Query service
// =============================================================================

/// In-memory query service
///
/// Records every executed request. Each call sleeps for the next queued
/// delay (or the default) and answers with one row echoing the value of
/// the first root-level rule.
pub struct RecordingService {
    default_delay: Duration,
    delays: Mutex<VecDeque<Duration>>,
    executed: Mutex<Vec<VisualizerQueryRequest>>,
    fail_schema: bool,
}

impl RecordingService {
    pub fn new(default_delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            default_delay: Duration::from_millis(default_delay_ms),
            delays: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            fail_schema: false,
        })
    }

    pub fn without_schema() -> Arc<Self> {
        Arc::new(Self {
            default_delay: Duration::from_millis(10),
            delays: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            fail_schema: true,
        })
    }

    /// Delays for the next calls, in call order
    pub fn queue_delays(&self, delays_ms: &[u64]) {
        let mut delays = self.delays.lock().unwrap();
        delays.extend(delays_ms.iter().map(|ms| Duration::from_millis(*ms)));
    }

    pub fn executions(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn executed(&self) -> Vec<VisualizerQueryRequest> {
        self.executed.lock().unwrap().clone()
    }
}

impl QueryService for RecordingService {
    fn fetch_schema(&self) -> ServiceFuture<'_, ExecutionResult<VisualizerSchema>> {
        let fail = self.fail_schema;
        Box::pin(async move {
            if fail {
                return Err(ExecutionError::service(503, "schema offline"));
            }
            Ok(call_schema())
        })
    }

    fn execute<'a>(
        &'a self,
        request: &'a VisualizerQueryRequest,
    ) -> ServiceFuture<'a, ExecutionResult<VisualizerQueryResult>> {
        self.executed.lock().unwrap().push(request.clone());
        let delay = self
            .delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_delay);

        Box::pin(async move {
            tokio::time::sleep(delay).await;
            let echoed = request
                .filters
                .rules
                .first()
                .and_then(|node| node.as_rule())
                .map(|rule| rule.value.clone())
                .unwrap_or(Value::Null);
            Ok(VisualizerQueryResult::from_rows(
                vec!["value".into(), "count_*".into()],
                vec![vec![echoed, json!(1)]],
            ))
        })
    }
}

// =============================================================================
// Requests and state
// =============================================================================

/// Request filtering `duration > value`
pub fn duration_request(value: i64) -> VisualizerQueryRequest {
    VisualizerQueryRequest {
        filters: FilterGroup::empty()
            .with_child(FilterRule::new("duration", Operator::Gt, json!(value)).into()),
        group_by: vec![],
        aggregations: vec![],
        sort: vec![],
        limit: 1000,
        include_join_hint: None,
    }
}

/// Waits until the coordinator is neither debouncing nor fetching
pub async fn settled(rx: &mut watch::Receiver<QuerySnapshot>) -> QuerySnapshot {
    let snapshot = rx.wait_for(|s| s.is_settled()).await.unwrap().clone();
    snapshot
}

/// Value echoed by the applied result
pub fn echoed(snapshot: &QuerySnapshot) -> Value {
    snapshot.result().expect("no applied result").rows[0]["value"].clone()
}
