use shared::error::ProtocolViolation;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
    #[error("{endpoint} rejected the query: {violation}")]
    Rejected {
        endpoint: String,
        violation: ProtocolViolation,
    },
}

impl ServiceError {
    pub fn transport(endpoint: impl Into<String>, err: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, err: impl ToString) -> Self {
        Self::Malformed {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Status { .. } | Self::Malformed { .. } | Self::Rejected { .. } => {
                FailureKind::Protocol
            }
        }
    }
}

/// Why a submission was ignored. Rejections never reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error("a request is already in flight")]
    Busy,
    #[error("input is empty")]
    EmptyInput,
    #[error("the conversation view has been closed")]
    Closed,
    #[error("action is not available on the current view")]
    WrongView,
}
