//! Errors surfaced by the directory and the session

use careline_messaging::MessagingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::SessionState;

/// Messaging operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FetchHistory,
    SendMessage,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::FetchHistory => write!(f, "fetch history"),
            Operation::SendMessage => write!(f, "send message"),
        }
    }
}

/// Failure of a session operation, held in session state for display
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to {operation}: {source}")]
pub struct SessionError {
    pub operation: Operation,
    #[source]
    pub source: MessagingError,
}

impl SessionError {
    pub fn new(operation: Operation, source: MessagingError) -> Self {
        Self { operation, source }
    }

    /// Text suitable for a toast or inline error line
    pub fn user_message(&self) -> String {
        self.source.to_string()
    }
}

/// Failure of a directory load
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Failed to load counterparts: {0}")]
    Messaging(#[from] MessagingError),

    #[error("No operator identity to load counterparts for")]
    NoOperator,
}

/// Why a send was refused before any request was issued
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    #[error("Message body is empty")]
    BlankBody,

    #[error("No counterpart selected")]
    NoCounterpart,

    #[error("Session is {0}, sends are accepted only when ready")]
    NotReady(SessionState),
}
