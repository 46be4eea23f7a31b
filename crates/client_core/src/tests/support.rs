use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{Namespace, RepositoryReference},
    error::ProtocolViolation,
    protocol::{Answer, IngestAck, QueryStatus},
};
use tokio::sync::oneshot;

use crate::{error::ServiceError, RemoteService};

pub(crate) fn answer(content: &str) -> Answer {
    Answer {
        content: content.to_string(),
        context_files: Vec::new(),
    }
}

pub(crate) fn connection_refused() -> ServiceError {
    ServiceError::transport("http://service.test/query-codebase/", "connection refused")
}

pub(crate) fn index_not_found() -> ServiceError {
    ServiceError::Rejected {
        endpoint: "http://service.test/query-codebase/".to_string(),
        violation: ProtocolViolation::UnsuccessfulStatus {
            status: QueryStatus::Error,
            message: Some("index not found".to_string()),
        },
    }
}

pub(crate) fn server_error() -> ServiceError {
    ServiceError::Status {
        endpoint: "http://service.test/process-repo/".to_string(),
        status: 500,
    }
}

/// Replays queued results in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedService {
    ingest_results: Mutex<VecDeque<Result<IngestAck, ServiceError>>>,
    query_results: Mutex<VecDeque<Result<Answer, ServiceError>>>,
    ingested: Mutex<Vec<String>>,
    queries: Mutex<Vec<(String, String)>>,
}

impl ScriptedService {
    pub(crate) fn with_query_results(results: Vec<Result<Answer, ServiceError>>) -> Arc<Self> {
        let service = Self::default();
        *service.query_results.lock().expect("lock") = results.into();
        Arc::new(service)
    }

    pub(crate) fn with_ingest_results(results: Vec<Result<IngestAck, ServiceError>>) -> Arc<Self> {
        let service = Self::default();
        *service.ingest_results.lock().expect("lock") = results.into();
        Arc::new(service)
    }

    pub(crate) fn ingested(&self) -> Vec<String> {
        self.ingested.lock().expect("lock").clone()
    }

    pub(crate) fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RemoteService for ScriptedService {
    async fn ingest(&self, reference: &RepositoryReference) -> Result<IngestAck, ServiceError> {
        self.ingested
            .lock()
            .expect("lock")
            .push(reference.to_string());
        self.ingest_results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(IngestAck::default()))
    }

    async fn query(&self, text: &str, namespace: &Namespace) -> Result<Answer, ServiceError> {
        self.queries
            .lock()
            .expect("lock")
            .push((text.to_string(), namespace.to_string()));
        self.query_results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::transport("scripted", "no scripted result")))
    }
}

/// Holds a single call open until the test releases it.
pub(crate) struct GatedService {
    started: Mutex<Option<oneshot::Sender<String>>>,
    release: Mutex<Option<oneshot::Receiver<Result<Answer, ServiceError>>>>,
}

pub(crate) struct Gate {
    pub(crate) started: oneshot::Receiver<String>,
    pub(crate) release: oneshot::Sender<Result<Answer, ServiceError>>,
}

impl GatedService {
    pub(crate) fn new() -> (Arc<Self>, Gate) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let service = Arc::new(Self {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        (
            service,
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }

    async fn hold(&self, input: String) -> Result<Answer, ServiceError> {
        if let Some(started) = self.started.lock().expect("lock").take() {
            let _ = started.send(input);
        }
        let release = self.release.lock().expect("lock").take();
        match release {
            Some(release) => release
                .await
                .unwrap_or_else(|_| Err(ServiceError::transport("gated", "gate dropped"))),
            None => Err(ServiceError::transport("gated", "gate already used")),
        }
    }
}

#[async_trait]
impl RemoteService for GatedService {
    async fn ingest(&self, reference: &RepositoryReference) -> Result<IngestAck, ServiceError> {
        self.hold(reference.to_string())
            .await
            .map(|_| IngestAck::default())
    }

    async fn query(&self, text: &str, _namespace: &Namespace) -> Result<Answer, ServiceError> {
        self.hold(text.to_string()).await
    }
}
