//! Domain layer for Conversations: state machine, errors, and the view model

pub mod error;
pub mod state;
pub mod view;
