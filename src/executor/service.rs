//! Query service abstraction
//!
//! Both endpoints the engine consumes are read-only, so every call is safe
//! to retry, cache and share between callers.

use std::future::Future;
use std::pin::Pin;

use super::errors::ExecutionResult;
use crate::request::{VisualizerQueryRequest, VisualizerQueryResult};
use crate::schema::VisualizerSchema;

/// Boxed future returned by [`QueryService`] methods
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Schema and query endpoints
pub trait QueryService: Send + Sync {
    /// Fetches the schema catalog
    fn fetch_schema(&self) -> ServiceFuture<'_, ExecutionResult<VisualizerSchema>>;

    /// Executes a read-only query
    fn execute<'a>(
        &'a self,
        request: &'a VisualizerQueryRequest,
    ) -> ServiceFuture<'a, ExecutionResult<VisualizerQueryResult>>;
}
