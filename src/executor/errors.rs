//! Query execution error types
//!
//! Error codes:
//! - VIZ_QUERY_NETWORK (ERROR)
//! - VIZ_QUERY_SERVICE (ERROR)
//! - VIZ_QUERY_DECODE (ERROR)
//! - VIZ_QUERY_TIMEOUT (ERROR)
//!
//! Every execution error is recoverable: the next successful execution
//! clears it.

use std::fmt;

/// Query execution error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorCode {
    /// Query service unreachable
    VizQueryNetwork,
    /// Query service answered with a non-success status
    VizQueryService,
    /// Response body is not a valid result
    VizQueryDecode,
    /// No response within the request timeout
    VizQueryTimeout,
}

impl ExecutionErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionErrorCode::VizQueryNetwork => "VIZ_QUERY_NETWORK",
            ExecutionErrorCode::VizQueryService => "VIZ_QUERY_SERVICE",
            ExecutionErrorCode::VizQueryDecode => "VIZ_QUERY_DECODE",
            ExecutionErrorCode::VizQueryTimeout => "VIZ_QUERY_TIMEOUT",
        }
    }
}

impl fmt::Display for ExecutionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query execution error with context
///
/// Cloneable so one failure can be handed to every caller that joined the
/// same in-flight execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    code: ExecutionErrorCode,
    message: String,
    /// HTTP status, when the service answered
    status: Option<u16>,
}

impl ExecutionError {
    /// Create a network error
    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutionErrorCode::VizQueryNetwork,
            message: reason.into(),
            status: None,
        }
    }

    /// Create a service error from a non-success response
    pub fn service(status: u16, reason: impl Into<String>) -> Self {
        Self {
            code: ExecutionErrorCode::VizQueryService,
            message: format!("Query service returned {}: {}", status, reason.into()),
            status: Some(status),
        }
    }

    /// Create a decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutionErrorCode::VizQueryDecode,
            message: reason.into(),
            status: None,
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            code: ExecutionErrorCode::VizQueryTimeout,
            message: format!("No response within {}ms", timeout_ms),
            status: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutionErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status if the service answered
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Always true; kept so callers can branch uniformly with other errors
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ExecutionError {}

/// Result type for query execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;
