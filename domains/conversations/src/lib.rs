//! Conversations domain: counterpart directory, conversation sessions

pub mod domain;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::error::{DirectoryError, Operation, SendRejection, SessionError};
pub use domain::state::{SessionEvent, SessionState, SessionStateMachine, StateError};
pub use domain::view::{
    ConversationView, FetchOutcome, FetchTicket, SendOutcome, SendTicket, SessionSnapshot,
};

// Re-export service types
pub use service::{ConversationDirectory, ConversationSession};

// Re-export the messaging data model used throughout the public API
pub use careline_messaging::{Counterpart, Direction, Message};
