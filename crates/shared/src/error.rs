use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::QueryStatus;

pub const RELAY_FAILURE_MESSAGE: &str = "Failed to process message";

/// Error body returned by the relay alongside a server-error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayError {
    pub error: String,
    pub details: String,
}

impl RelayError {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn failed_to_process(details: impl Into<String>) -> Self {
        Self::new(RELAY_FAILURE_MESSAGE, details)
    }
}

/// A query response that parsed but does not carry an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("query status was {status:?}: {}", message.as_deref().unwrap_or("no message"))]
    UnsuccessfulStatus {
        status: QueryStatus,
        message: Option<String>,
    },
    #[error("successful query response is missing the `response` field")]
    MissingResponse,
}
