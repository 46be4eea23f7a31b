//! Conversation controller: owns one view's transcript and sequences queries.
//!
//! The controller cycles between idle and pending. A submission appends the
//! user turn immediately, marks the controller busy and sends one query; the
//! response either appends an assistant turn or produces a [`Notice`]. While
//! busy, every other submission is rejected, so at most one query is ever in
//! flight and responses are applied in request order.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::{
    domain::{ConversationId, ConversationTurn, Namespace},
    protocol::Answer,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{GuardRejection, ServiceError},
    notice::Notice,
    RemoteService,
};

#[derive(Debug, Clone)]
pub enum ConversationEvent {
    TurnAppended(ConversationTurn),
    BusyChanged(bool),
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Answered(ConversationTurn),
    Failed(Notice),
    Rejected(GuardRejection),
    /// The view was closed while the query was in flight; nothing was applied.
    Discarded,
}

#[derive(Default)]
struct ConversationState {
    transcript: Vec<ConversationTurn>,
    draft: String,
    closed: bool,
}

pub struct ConversationController {
    id: ConversationId,
    service: Arc<dyn RemoteService>,
    namespace: Namespace,
    state: Mutex<ConversationState>,
    busy: AtomicBool,
    events: broadcast::Sender<ConversationEvent>,
}

/// Returns the controller to idle if a submission is dropped mid-flight.
struct PendingGuard<'a> {
    controller: &'a ConversationController,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.busy.store(false, Ordering::Release);
            debug!(conversation = %self.controller.id, "submission dropped before completion");
            let _ = self
                .controller
                .events
                .send(ConversationEvent::BusyChanged(false));
        }
    }
}

impl ConversationController {
    pub fn new(service: Arc<dyn RemoteService>, namespace: Namespace) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            id: ConversationId::new(),
            service,
            namespace,
            state: Mutex::new(ConversationState::default()),
            busy: AtomicBool::new(false),
            events,
        })
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub async fn transcript(&self) -> Vec<ConversationTurn> {
        self.state.lock().await.transcript.clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().await.draft = text.into();
    }

    /// Submits whatever is in the draft buffer.
    pub async fn submit_draft(&self) -> SubmitOutcome {
        let draft = self.draft().await;
        self.submit(&draft).await
    }

    pub async fn submit(&self, user_text: &str) -> SubmitOutcome {
        if let Err(rejection) = self.begin(user_text).await {
            debug!(conversation = %self.id, %rejection, "submission ignored");
            return SubmitOutcome::Rejected(rejection);
        }

        let pending = PendingGuard {
            controller: self,
            armed: true,
        };

        debug!(conversation = %self.id, namespace = %self.namespace, "query dispatched");
        let result = self.service.query(user_text, &self.namespace).await;
        self.complete(result, pending).await
    }

    /// Tears the view down. A response that arrives afterwards is dropped.
    pub async fn close(&self) {
        let mut guard = self.state.lock().await;
        if !guard.closed {
            guard.closed = true;
            debug!(
                conversation = %self.id,
                busy = self.busy.load(Ordering::Acquire),
                "conversation closed"
            );
        }
    }

    async fn begin(&self, user_text: &str) -> Result<(), GuardRejection> {
        let turn = {
            let mut guard = self.state.lock().await;
            if guard.closed {
                return Err(GuardRejection::Closed);
            }
            if self.busy.load(Ordering::Acquire) {
                return Err(GuardRejection::Busy);
            }
            if user_text.trim().is_empty() {
                return Err(GuardRejection::EmptyInput);
            }

            let turn = ConversationTurn::user(user_text);
            guard.transcript.push(turn.clone());
            guard.draft.clear();
            // Set only while the state lock is held.
            self.busy.store(true, Ordering::Release);
            turn
        };

        let _ = self.events.send(ConversationEvent::TurnAppended(turn));
        let _ = self.events.send(ConversationEvent::BusyChanged(true));
        Ok(())
    }

    async fn complete(
        &self,
        result: Result<Answer, ServiceError>,
        mut pending: PendingGuard<'_>,
    ) -> SubmitOutcome {
        let mut guard = self.state.lock().await;
        pending.disarm();
        if guard.closed {
            debug!(conversation = %self.id, "discarding response for closed conversation");
            return SubmitOutcome::Discarded;
        }
        self.busy.store(false, Ordering::Release);

        match result {
            Ok(answer) => {
                let turn = ConversationTurn::assistant(answer.content, answer.context_files);
                guard.transcript.push(turn.clone());
                let turns = guard.transcript.len();
                drop(guard);

                info!(
                    conversation = %self.id,
                    turns,
                    cited = turn.context_files().len(),
                    "assistant turn appended"
                );
                let _ = self.events.send(ConversationEvent::TurnAppended(turn.clone()));
                let _ = self.events.send(ConversationEvent::BusyChanged(false));
                SubmitOutcome::Answered(turn)
            }
            Err(err) => {
                drop(guard);

                warn!(conversation = %self.id, kind = ?err.kind(), error = %err, "query failed");
                let notice = Notice::query_failed(&err);
                let _ = self.events.send(ConversationEvent::Notice(notice.clone()));
                let _ = self.events.send(ConversationEvent::BusyChanged(false));
                SubmitOutcome::Failed(notice)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/conversation_tests.rs"]
mod tests;
