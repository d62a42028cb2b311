//! querylens - query model and query lifecycle engine for an ad-hoc
//! analytics visualizer
//!
//! An operator composes nested filter conditions, group-by keys and
//! aggregations against a schema-described dataset. This crate owns the
//! models behind that editor, turns them into read-only query requests,
//! executes them with debouncing and caching, and maps results onto
//! chart bindings. Rendering is left to the caller.

pub mod aggregation;
pub mod config;
pub mod executor;
pub mod filter;
pub mod id;
pub mod observability;
pub mod request;
pub mod schema;
pub mod session;
pub mod viz;

pub use config::{ConfigError, ConfigResult, VisualizerConfig};
pub use session::QueryBuilderSession;
