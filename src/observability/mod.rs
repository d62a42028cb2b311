//! Observability subsystem
//!
//! - Structured JSON logging
//! - Typed lifecycle events
//! - Monotonic query counters
//!
//! Observability is read-only: nothing here feeds back into execution,
//! and a logging failure never surfaces as an error.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, QueryMetrics};

/// Log a lifecycle event with fields
///
/// Failure events go out at ERROR, chatty ones at TRACE, the rest at INFO.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else if event.is_chatty() {
        Severity::Trace
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Just verifies no panic
        log_event(Event::SessionOpened, &[]);
        log_event(Event::QueryFailed, &[("code", "VIZ_QUERY_NETWORK")]);
    }
}
