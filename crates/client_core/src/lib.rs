use async_trait::async_trait;
use shared::{
    domain::{Namespace, RepositoryReference},
    protocol::{Answer, IngestAck},
};

pub mod conversation;
pub mod error;
pub mod http;
pub mod ingestion;
pub mod notice;
pub mod session;

pub use conversation::{ConversationController, ConversationEvent, SubmitOutcome};
pub use error::{FailureKind, GuardRejection, ServiceError};
pub use http::HttpRemoteService;
pub use ingestion::{IngestionOutcome, IngestionTrigger};
pub use notice::{Notice, NoticeContext};
pub use session::{Session, View};

/// The remote ingestion/query service. Controllers only talk to the service
/// through this trait so they can run against substitutes in tests.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn ingest(&self, reference: &RepositoryReference) -> Result<IngestAck, ServiceError>;
    async fn query(&self, text: &str, namespace: &Namespace) -> Result<Answer, ServiceError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
