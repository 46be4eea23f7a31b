use crate::error::{FailureKind, ServiceError};

pub const INGESTION_FAILED_NOTICE: &str = "Something went wrong. Please try again.";
pub const QUERY_FAILED_NOTICE: &str = "Failed to get response from the chatbot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Ingestion,
    Query,
}

/// Transient, user-visible failure report. Notices are never part of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    context: NoticeContext,
    kind: FailureKind,
    message: String,
    detail: String,
}

impl Notice {
    pub fn ingestion_failed(err: &ServiceError) -> Self {
        Self::from_error(NoticeContext::Ingestion, INGESTION_FAILED_NOTICE, err)
    }

    pub fn query_failed(err: &ServiceError) -> Self {
        Self::from_error(NoticeContext::Query, QUERY_FAILED_NOTICE, err)
    }

    fn from_error(context: NoticeContext, message: &str, err: &ServiceError) -> Self {
        Self {
            context,
            kind: err.kind(),
            message: message.to_string(),
            detail: err.to_string(),
        }
    }

    pub fn context(&self) -> NoticeContext {
        self.context
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Generic text shown to the user; identical for every failure cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}
