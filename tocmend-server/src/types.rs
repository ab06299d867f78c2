//! API response types

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Structured failure payload returned with every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub traceback: String,
}

impl ErrorResponse {
    /// A client-side error with no useful diagnostic chain.
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            traceback: String::new(),
        }
    }

    /// A server-side failure; the debug rendering carries the cause chain.
    pub fn from_failure<E: std::fmt::Display + std::fmt::Debug>(err: &E) -> Self {
        Self {
            error: err.to_string(),
            traceback: format!("{err:?}"),
        }
    }
}
