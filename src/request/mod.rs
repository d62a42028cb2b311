//! Query request builder
//!
//! Turns the filter tree and aggregation model into the query endpoint's
//! request body. The builder decides what is sent; whether it is worth
//! sending is the coordinator's call.

mod builder;
mod types;

pub use builder::{build_request, RequestBuilder, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};
pub use types::{SortDirection, SortSpec, VisualizerQueryRequest, VisualizerQueryResult};
