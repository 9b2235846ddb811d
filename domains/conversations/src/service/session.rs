//! Conversation session bound to a messaging backend
//!
//! Wraps a `ConversationView` behind a lock and performs the I/O for it. The
//! lock is never held across a request, so selections, sends, and reads from
//! other tasks stay responsive while a request is in flight. A fetch that is
//! overtaken by a newer selection is cancelled; a send is left to finish (the
//! backend may already have stored it) and its confirmation is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use careline_common::Identity;
use careline_messaging::{Direction, Message, MessagingService};
use tokio_util::sync::CancellationToken;

use crate::domain::error::SessionError;
use crate::domain::state::SessionState;
use crate::domain::view::{
    ConversationView, FetchOutcome, FetchTicket, SendOutcome, SessionSnapshot,
};

struct SessionInner {
    view: ConversationView,
    /// Cancels the fetch for the current selection
    fetch_cancel: Option<CancellationToken>,
}

/// A conversation between one operator and whichever counterpart is selected
pub struct ConversationSession {
    api: Arc<dyn MessagingService>,
    inner: Mutex<SessionInner>,
    fixed_counterpart: Option<Identity>,
}

impl ConversationSession {
    pub fn new(api: Arc<dyn MessagingService>, operator_id: Identity) -> Self {
        Self {
            api,
            inner: Mutex::new(SessionInner {
                view: ConversationView::new(operator_id),
                fetch_cancel: None,
            }),
            fixed_counterpart: None,
        }
    }

    /// Session pinned to one counterpart; call [`activate`](Self::activate) to load it.
    pub fn with_counterpart(
        api: Arc<dyn MessagingService>,
        operator_id: Identity,
        counterpart_id: Identity,
    ) -> Self {
        Self {
            fixed_counterpart: Some(counterpart_id),
            ..Self::new(api, operator_id)
        }
    }

    /// Load the pinned counterpart, if any
    pub async fn activate(&self) -> FetchOutcome {
        match &self.fixed_counterpart {
            Some(counterpart_id) => self.select_counterpart(counterpart_id.clone()).await,
            None => FetchOutcome::Unchanged,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to `counterpart_id` and load its history
    pub async fn select_counterpart(&self, counterpart_id: Identity) -> FetchOutcome {
        let started = {
            let mut inner = self.lock();
            inner
                .view
                .select_counterpart(counterpart_id)
                .map(|ticket| (ticket, Self::replace_cancel(&mut inner)))
        };

        match started {
            Some((ticket, token)) => self.run_fetch(ticket, token).await,
            None => FetchOutcome::Unchanged,
        }
    }

    /// Re-fetch the active conversation on explicit request
    pub async fn reload(&self) -> FetchOutcome {
        let started = {
            let mut inner = self.lock();
            inner
                .view
                .reload()
                .map(|ticket| (ticket, Self::replace_cancel(&mut inner)))
        };

        match started {
            Some((ticket, token)) => self.run_fetch(ticket, token).await,
            None => FetchOutcome::Unchanged,
        }
    }

    /// Return to idle, cancelling any fetch in flight
    pub fn clear_selection(&self) {
        let mut inner = self.lock();
        if let Some(token) = inner.fetch_cancel.take() {
            token.cancel();
        }
        inner.view.clear_selection();
    }

    fn replace_cancel(inner: &mut SessionInner) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = inner.fetch_cancel.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    async fn run_fetch(&self, ticket: FetchTicket, token: CancellationToken) -> FetchOutcome {
        let result = tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(
                    counterpart_id = %ticket.request.counterpart_id,
                    "History fetch cancelled by a newer selection"
                );
                return FetchOutcome::Superseded;
            }
            result = self.api.fetch_history(ticket.request.clone()) => result,
        };

        let mut inner = self.lock();
        let outcome = inner.view.complete_fetch(ticket, result);
        if outcome != FetchOutcome::Superseded {
            inner.fetch_cancel = None;
        }
        outcome
    }

    /// Send `body` to the active counterpart
    pub async fn send(&self, body: &str) -> SendOutcome {
        let ticket = match self.lock().view.begin_send(body) {
            Ok(ticket) => ticket,
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "Send rejected");
                return SendOutcome::Rejected(rejection);
            }
        };

        let result = self.api.send_message(ticket.request.clone()).await;
        self.lock().view.complete_send(ticket, result)
    }

    /// Send the current draft
    pub async fn send_draft(&self) -> SendOutcome {
        let draft = self.draft();
        self.send(&draft).await
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().view.set_draft(text);
    }

    pub fn dismiss_error(&self) {
        self.lock().view.dismiss_error();
    }

    pub fn operator_id(&self) -> Identity {
        self.lock().view.operator_id().clone()
    }

    pub fn counterpart_id(&self) -> Option<Identity> {
        self.lock().view.counterpart_id().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.lock().view.state()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().view.messages().to_vec()
    }

    pub fn draft(&self) -> String {
        self.lock().view.draft().to_string()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.lock().view.last_error().cloned()
    }

    pub fn history_failed(&self) -> bool {
        self.lock().view.history_failed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().view.snapshot()
    }

    /// Whether `message` was sent by this session's operator
    #[mutants::skip] // Delegates to Message::direction_for
    pub fn direction_of(&self, message: &Message) -> Direction {
        message.direction_for(self.lock().view.operator_id())
    }
}
