use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::RepositoryReference;
use tracing::{debug, info, warn};

use crate::{error::GuardRejection, notice::Notice, RemoteService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    Acknowledged,
    Failed(Notice),
    Rejected(GuardRejection),
}

/// Submits a repository reference for ingestion, once per call and never retried.
pub struct IngestionTrigger {
    service: Arc<dyn RemoteService>,
    busy: AtomicBool,
}

/// Clears the busy flag when the submission finishes or its future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IngestionTrigger {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self {
            service,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn submit_repository(&self, reference: RepositoryReference) -> IngestionOutcome {
        if reference.as_str().trim().is_empty() {
            return IngestionOutcome::Rejected(GuardRejection::EmptyInput);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(%reference, "ingestion already in flight");
            return IngestionOutcome::Rejected(GuardRejection::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        match self.service.ingest(&reference).await {
            Ok(_) => {
                info!(%reference, "repository submitted for ingestion");
                IngestionOutcome::Acknowledged
            }
            Err(err) => {
                warn!(%reference, kind = ?err.kind(), error = %err, "ingestion request failed");
                IngestionOutcome::Failed(Notice::ingestion_failed(&err))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/ingestion_tests.rs"]
mod tests;
