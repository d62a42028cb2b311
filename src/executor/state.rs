//! Observable coordinator state

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::errors::ExecutionError;
use crate::request::VisualizerQueryResult;

/// Lifecycle of the current request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing to execute
    #[default]
    Idle,
    /// Waiting for input to settle
    Debouncing,
    /// Waiting for the query service
    Fetching,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Debouncing => "debouncing",
            QueryStatus::Fetching => "fetching",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a coordinator
///
/// `data` is the last good result and survives errors and new requests;
/// it is replaced wholesale by the next success and cleared only when the
/// request becomes unexecutable or the coordinator is reset.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<Arc<VisualizerQueryResult>>,
    /// Cache key of the request `data` answers
    pub data_key: Option<String>,
    pub data_updated_at: Option<DateTime<Utc>>,
    /// Last failure; cleared by the next success
    pub error: Option<ExecutionError>,
    /// Generation of the latest submitted request
    pub generation: u64,
    /// A request for the current key is in flight, stale data may be shown
    pub is_fetching: bool,
}

impl QuerySnapshot {
    /// Result of the current request, only when it succeeded
    pub fn result(&self) -> Option<&Arc<VisualizerQueryResult>> {
        match self.status {
            QueryStatus::Success => self.data.as_ref(),
            _ => None,
        }
    }

    /// Last successful result, whatever the current status
    pub fn last_good(&self) -> Option<&Arc<VisualizerQueryResult>> {
        self.data.as_ref()
    }

    /// Succeeded with zero rows
    pub fn is_empty(&self) -> bool {
        self.result().map_or(false, |r| r.row_count == 0)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Debouncing | QueryStatus::Fetching)
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            QueryStatus::Idle | QueryStatus::Success | QueryStatus::Error
        ) && !self.is_fetching
    }
}
