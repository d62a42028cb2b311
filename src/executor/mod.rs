//! Query execution subsystem
//!
//! Consumes serialized requests and produces observable query state.
//!
//! # Execution Flow (strict order)
//!
//! 1. Ignore a request identical to the last one submitted
//! 2. Gate: a request whose filter root has no rules returns to idle
//! 3. Debounce: only the request present when the window elapses commits
//! 4. Serve a fresh cached result, or a stale one while refetching
//! 5. Join an identical in-flight execution, or start one
//! 6. Apply the outcome only if its generation is still the latest
//!
//! # Invariants
//!
//! - Intermediate edits never reach the query service
//! - A superseded response never overwrites a newer one
//! - Every error is recoverable by the next success

mod cache;
mod coordinator;
mod debounce;
mod errors;
mod http;
mod service;
mod state;

pub use cache::{CacheLookup, ResultCache};
pub use coordinator::{CoordinatorSettings, QueryCoordinator};
pub use debounce::Debouncer;
pub use errors::{ExecutionError, ExecutionErrorCode, ExecutionResult};
pub use http::HttpQueryService;
pub use service::{QueryService, ServiceFuture};
pub use state::{QuerySnapshot, QueryStatus};
