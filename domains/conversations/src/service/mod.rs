//! Async services binding the conversation domain to a messaging backend

pub mod directory;
pub mod session;

pub use directory::ConversationDirectory;
pub use session::ConversationSession;
