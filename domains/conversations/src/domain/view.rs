//! Conversation view model
//!
//! Synchronous core of a conversation session. Every fetch and send is issued
//! against a ticket tagged with the selection generation; a completion is only
//! applied while its generation is current and the state machine accepts it.
//! Whatever performs the I/O (see `service::session`) asks the view for a
//! ticket, runs the request, and hands the result back.

use careline_common::Identity;
use careline_messaging::{FetchHistoryRequest, Message, MessagingError, SendMessageRequest};

use super::error::{Operation, SendRejection, SessionError};
use super::state::{SessionEvent, SessionState, SessionStateMachine, StateError};

/// Permission to run one history fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub request: FetchHistoryRequest,
}

/// Permission to run one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    generation: u64,
    pub request: SendMessageRequest,
}

/// Result of selecting, reloading, or completing a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// History applied; carries the number of messages now held
    Loaded(usize),
    /// Counterpart already active, nothing fetched
    Unchanged,
    /// Fetch failed; session is ready with an empty list
    Failed(SessionError),
    /// A later selection took over before this fetch finished
    Superseded,
}

/// Result of a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Confirmed by the backend and appended
    Delivered(Message),
    /// Refused locally, no request issued
    Rejected(SendRejection),
    /// Backend or transport failure; draft kept for retry
    Failed(SessionError),
    /// Confirmation arrived after the counterpart changed and was dropped
    Discarded,
}

/// Point-in-time copy of session state for UI binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub operator_id: Identity,
    pub counterpart_id: Option<Identity>,
    pub messages: Vec<Message>,
    pub draft: String,
    pub last_error: Option<SessionError>,
}

#[derive(Debug, Clone)]
pub struct ConversationView {
    operator_id: Identity,
    counterpart_id: Option<Identity>,
    state: SessionState,
    messages: Vec<Message>,
    draft: String,
    last_error: Option<SessionError>,
    generation: u64,
}

impl ConversationView {
    pub fn new(operator_id: Identity) -> Self {
        Self {
            operator_id,
            counterpart_id: None,
            state: SessionState::Idle,
            messages: Vec::new(),
            draft: String::new(),
            last_error: None,
            generation: 0,
        }
    }

    pub fn operator_id(&self) -> &Identity {
        &self.operator_id
    }

    pub fn counterpart_id(&self) -> Option<&Identity> {
        self.counterpart_id.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Whether the empty list is the result of a failed load rather than a new conversation
    pub fn history_failed(&self) -> bool {
        matches!(
            &self.last_error,
            Some(SessionError {
                operation: Operation::FetchHistory,
                ..
            })
        )
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            operator_id: self.operator_id.clone(),
            counterpart_id: self.counterpart_id.clone(),
            messages: self.messages.clone(),
            draft: self.draft.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Activate a counterpart. Returns `None` when it is already active.
    pub fn select_counterpart(&mut self, counterpart_id: Identity) -> Option<FetchTicket> {
        if self.counterpart_id.as_ref() == Some(&counterpart_id) {
            tracing::debug!(counterpart_id = %counterpart_id, "Counterpart already active");
            return None;
        }

        tracing::info!(
            operator_id = %self.operator_id,
            counterpart_id = %counterpart_id,
            "Switching conversation"
        );

        let ticket = self.begin_fetch(counterpart_id.clone())?;
        self.counterpart_id = Some(counterpart_id);
        self.draft.clear();
        Some(ticket)
    }

    /// Re-fetch the active conversation. Only allowed once the session is ready.
    pub fn reload(&mut self) -> Option<FetchTicket> {
        if self.state != SessionState::Ready {
            return None;
        }
        let counterpart_id = self.counterpart_id.clone()?;
        self.begin_fetch(counterpart_id)
    }

    /// Drop the selection and everything tied to it
    pub fn clear_selection(&mut self) {
        if let Err(e) = self.apply(SessionEvent::Clear) {
            tracing::warn!(error = %e, "Cannot clear selection");
            return;
        }
        self.generation += 1;
        self.counterpart_id = None;
        self.messages.clear();
        self.draft.clear();
        self.last_error = None;
    }

    fn begin_fetch(&mut self, counterpart_id: Identity) -> Option<FetchTicket> {
        if let Err(e) = self.apply(SessionEvent::Select) {
            tracing::warn!(error = %e, "Cannot start history fetch");
            return None;
        }
        self.generation += 1;
        self.messages.clear();
        self.last_error = None;

        Some(FetchTicket {
            generation: self.generation,
            request: FetchHistoryRequest {
                counterpart_id,
                operator_id: self.operator_id.clone(),
            },
        })
    }

    /// Apply the result of the fetch issued for `ticket`
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Message>, MessagingError>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            tracing::warn!(
                counterpart_id = %ticket.request.counterpart_id,
                "Discarding stale history response"
            );
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(history) => {
                if let Err(e) = self.apply(SessionEvent::FetchSucceeded) {
                    tracing::warn!(error = %e, "Discarding history response");
                    return FetchOutcome::Superseded;
                }

                let counterpart_id = &ticket.request.counterpart_id;
                let total = history.len();
                self.messages = history
                    .into_iter()
                    .filter(|m| m.is_between(&self.operator_id, counterpart_id))
                    .collect();

                if self.messages.len() != total {
                    tracing::warn!(
                        counterpart_id = %counterpart_id,
                        dropped = total - self.messages.len(),
                        "History contained messages from other conversations"
                    );
                }

                tracing::debug!(count = self.messages.len(), "History loaded");
                FetchOutcome::Loaded(self.messages.len())
            }
            Err(source) => {
                if let Err(e) = self.apply(SessionEvent::FetchFailed) {
                    tracing::warn!(error = %e, "Discarding history failure");
                    return FetchOutcome::Superseded;
                }

                tracing::warn!(
                    counterpart_id = %ticket.request.counterpart_id,
                    error = %source,
                    "Failed to load conversation history"
                );
                let error = SessionError::new(Operation::FetchHistory, source);
                self.messages.clear();
                self.last_error = Some(error.clone());
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Start a send. Guards run before any transition.
    pub fn begin_send(&mut self, body: &str) -> Result<SendTicket, SendRejection> {
        if !Message::is_sendable(body) {
            return Err(SendRejection::BlankBody);
        }
        let receiver_id = self
            .counterpart_id
            .clone()
            .ok_or(SendRejection::NoCounterpart)?;
        if !self.state.accepts_send() {
            return Err(SendRejection::NotReady(self.state));
        }

        self.apply(SessionEvent::SendStarted)
            .map_err(|_| SendRejection::NotReady(self.state))?;

        self.draft = body.to_string();
        self.last_error = None;

        Ok(SendTicket {
            generation: self.generation,
            request: SendMessageRequest {
                sender_id: self.operator_id.clone(),
                receiver_id,
                body: body.to_string(),
            },
        })
    }

    /// Apply the result of the send issued for `ticket`
    pub fn complete_send(
        &mut self,
        ticket: SendTicket,
        result: Result<Message, MessagingError>,
    ) -> SendOutcome {
        if ticket.generation != self.generation {
            tracing::warn!(
                receiver_id = %ticket.request.receiver_id,
                "Discarding send confirmation for an inactive conversation"
            );
            return SendOutcome::Discarded;
        }

        let result = result.and_then(|confirmed| {
            if confirmed.is_between(&ticket.request.sender_id, &ticket.request.receiver_id) {
                Ok(confirmed)
            } else {
                Err(MessagingError::Response(
                    "Confirmed message belongs to a different conversation".to_string(),
                ))
            }
        });

        match result {
            Ok(confirmed) => {
                if let Err(e) = self.apply(SessionEvent::SendSucceeded) {
                    tracing::warn!(error = %e, "Discarding send confirmation");
                    return SendOutcome::Discarded;
                }
                self.messages.push(confirmed.clone());
                self.draft.clear();
                SendOutcome::Delivered(confirmed)
            }
            Err(source) => {
                if let Err(e) = self.apply(SessionEvent::SendFailed) {
                    tracing::warn!(error = %e, "Discarding send failure");
                    return SendOutcome::Discarded;
                }
                tracing::warn!(
                    receiver_id = %ticket.request.receiver_id,
                    error = %source,
                    "Failed to send message"
                );
                let error = SessionError::new(Operation::SendMessage, source);
                self.last_error = Some(error.clone());
                SendOutcome::Failed(error)
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Result<(), StateError> {
        self.state = SessionStateMachine::transition(self.state, event)?;
        Ok(())
    }
}
