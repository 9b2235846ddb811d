//! State machine for a conversation session
//!
//! Session states: Idle → Loading → Ready ⇄ Sending, and → Loading from any
//! state on counterpart selection.

pub use careline_common::StateError;
use serde::{Deserialize, Serialize};

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No counterpart selected
    #[default]
    Idle,
    /// History fetch in flight
    Loading,
    /// History applied, sends accepted
    Ready,
    /// One send in flight, message list frozen
    Sending,
}

impl SessionState {
    /// Whether a send may start from this state
    pub fn accepts_send(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Sending => write!(f, "sending"),
        }
    }
}

/// Events that trigger session state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// A different counterpart was selected (or a reload was requested)
    Select,
    /// The selection was cleared
    Clear,
    FetchSucceeded,
    FetchFailed,
    SendStarted,
    SendSucceeded,
    SendFailed,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Clear => write!(f, "clear"),
            Self::FetchSucceeded => write!(f, "fetch_succeeded"),
            Self::FetchFailed => write!(f, "fetch_failed"),
            Self::SendStarted => write!(f, "send_started"),
            Self::SendSucceeded => write!(f, "send_succeeded"),
            Self::SendFailed => write!(f, "send_failed"),
        }
    }
}

/// Session state machine
pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: SessionState,
        event: SessionEvent,
    ) -> Result<SessionState, StateError> {
        let next = match (&current, &event) {
            (_, SessionEvent::Select) => SessionState::Loading,
            (_, SessionEvent::Clear) => SessionState::Idle,
            (SessionState::Loading, SessionEvent::FetchSucceeded | SessionEvent::FetchFailed) => {
                SessionState::Ready
            }
            (SessionState::Ready, SessionEvent::SendStarted) => SessionState::Sending,
            (SessionState::Sending, SessionEvent::SendSucceeded | SessionEvent::SendFailed) => {
                SessionState::Ready
            }
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
