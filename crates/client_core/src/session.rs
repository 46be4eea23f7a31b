use std::{mem, sync::Arc};

use shared::domain::{Namespace, RepositoryReference};
use tracing::info;

use crate::{
    conversation::ConversationController,
    error::GuardRejection,
    ingestion::{IngestionOutcome, IngestionTrigger},
    RemoteService,
};

pub enum View {
    Entry,
    Conversation(Arc<ConversationController>),
}

/// Navigation between the entry view and the conversation view.
pub struct Session {
    service: Arc<dyn RemoteService>,
    namespace: Namespace,
    ingestion: IngestionTrigger,
    view: View,
}

impl Session {
    pub fn new(service: Arc<dyn RemoteService>, namespace: Namespace) -> Self {
        Self {
            ingestion: IngestionTrigger::new(Arc::clone(&service)),
            service,
            namespace,
            view: View::Entry,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn conversation(&self) -> Option<Arc<ConversationController>> {
        match &self.view {
            View::Conversation(controller) => Some(Arc::clone(controller)),
            View::Entry => None,
        }
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingestion.is_busy()
    }

    /// Submits `reference` and, once acknowledged, opens an empty conversation.
    pub async fn submit_repository(&mut self, reference: impl Into<String>) -> IngestionOutcome {
        if !matches!(self.view, View::Entry) {
            return IngestionOutcome::Rejected(GuardRejection::WrongView);
        }

        let outcome = self
            .ingestion
            .submit_repository(RepositoryReference::new(reference))
            .await;
        if outcome == IngestionOutcome::Acknowledged {
            let controller =
                ConversationController::new(Arc::clone(&self.service), self.namespace.clone());
            info!(conversation = %controller.id(), "entering conversation view");
            self.view = View::Conversation(controller);
        }
        outcome
    }

    pub async fn back_home(&mut self) {
        if let View::Conversation(controller) = mem::replace(&mut self.view, View::Entry) {
            controller.close().await;
            info!(conversation = %controller.id(), "left conversation view");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
