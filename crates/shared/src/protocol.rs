use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ProtocolViolation;

pub fn ingest_route() -> &'static str {
    "/process-repo/"
}

pub fn query_route() -> &'static str {
    "/query-codebase/"
}

pub fn relay_chat_route() -> &'static str {
    "/api/chat"
}

/// Joins `route` onto `base`, keeping any path prefix `base` already has.
pub fn endpoint_url(base: &Url, route: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(route.trim_start_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub github_url: String,
}

/// Body of an ingestion acknowledgement. Only the status code decides success,
/// so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub content: String,
    pub context_files: Vec<String>,
}

impl QueryResponse {
    pub fn into_answer(self) -> Result<Answer, ProtocolViolation> {
        if self.status != QueryStatus::Success {
            return Err(ProtocolViolation::UnsuccessfulStatus {
                status: self.status,
                message: self.message,
            });
        }
        let content = self.response.ok_or(ProtocolViolation::MissingResponse)?;
        Ok(Answer {
            content,
            context_files: self.context_files.unwrap_or_default(),
        })
    }
}

/// Chat history posted to the relay. Messages are kept as received and
/// forwarded untouched; only the last entry's `content` is ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub messages: Vec<Value>,
}

impl RelayRequest {
    pub fn latest_content(&self) -> Option<&str> {
        self.messages.last()?.get("content")?.as_str()
    }
}

/// Compatibility shape the relay sends upstream: the canonical query fields
/// plus the full message list it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayForwardRequest {
    pub messages: Vec<Value>,
    pub query: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub response: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
