//! Observable events
//!
//! Events are explicit and typed; the logger only ever sees their
//! canonical names.

use std::fmt;

/// Observable events in the query lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema catalog
    /// Schema catalog fetched and validated
    SchemaLoaded,
    /// Schema catalog could not be fetched or parsed
    SchemaLoadFailed,
    /// Field type missing from the catalog's operator map
    SchemaOperatorsMissing,

    // Coordinator
    /// Request change accepted, debounce timer (re)started
    QueryDebounced,
    /// Request rejected by the enable condition
    QueryGated,
    /// Debounce timer fired, request committed
    QueryCommitted,
    /// Committed request served from a fresh cache entry
    QueryCacheHit,
    /// Committed request served stale, refetch started
    QueryCacheStale,
    /// Committed request joined an identical in-flight execution
    QueryJoinedInFlight,
    /// Query service returned a result
    QueryExecuted,
    /// Query service returned an error
    QueryFailed,
    /// A response arrived for a request that is no longer current
    QuerySuperseded,

    // Session
    /// Builder session opened
    SessionOpened,
    /// Builder session reset to its empty state
    SessionReset,
}

impl Event {
    /// Returns the canonical event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaLoadFailed => "SCHEMA_LOAD_FAILED",
            Event::SchemaOperatorsMissing => "SCHEMA_OPERATORS_MISSING",
            Event::QueryDebounced => "QUERY_DEBOUNCED",
            Event::QueryGated => "QUERY_GATED",
            Event::QueryCommitted => "QUERY_COMMITTED",
            Event::QueryCacheHit => "QUERY_CACHE_HIT",
            Event::QueryCacheStale => "QUERY_CACHE_STALE",
            Event::QueryJoinedInFlight => "QUERY_JOINED_IN_FLIGHT",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::QuerySuperseded => "QUERY_SUPERSEDED",
            Event::SessionOpened => "SESSION_OPENED",
            Event::SessionReset => "SESSION_RESET",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SchemaLoadFailed | Event::QueryFailed)
    }

    /// Returns true for high-volume events logged at TRACE
    pub fn is_chatty(&self) -> bool {
        matches!(self, Event::QueryDebounced | Event::QueryGated)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
