//! HTTP query service
//!
//! - `GET {base_url}/schema`
//! - `POST {base_url}/query` with the request as JSON body

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::errors::{ExecutionError, ExecutionResult};
use super::service::{QueryService, ServiceFuture};
use crate::config::VisualizerConfig;
use crate::request::{VisualizerQueryRequest, VisualizerQueryResult};
use crate::schema::VisualizerSchema;

/// Query service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    base_url: String,
    timeout_ms: u64,
    client: Client,
}

impl HttpQueryService {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self::new(config.base_url.clone(), config.request_timeout_ms)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ExecutionError {
        if err.is_timeout() {
            ExecutionError::timeout(self.timeout_ms)
        } else {
            ExecutionError::network(err.to_string())
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ExecutionResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::service(status.as_u16(), body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExecutionError::decode(e.to_string()))
    }
}

impl QueryService for HttpQueryService {
    fn fetch_schema(&self) -> ServiceFuture<'_, ExecutionResult<VisualizerSchema>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url("schema"))
                .timeout(Duration::from_millis(self.timeout_ms))
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?;
            self.decode(response).await
        })
    }

    fn execute<'a>(
        &'a self,
        request: &'a VisualizerQueryRequest,
    ) -> ServiceFuture<'a, ExecutionResult<VisualizerQueryResult>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("query"))
                .timeout(Duration::from_millis(self.timeout_ms))
                .json(request)
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?;
            self.decode(response).await
        })
    }
}
