//! Shared identities, configuration, and error handling for Careline
//!
//! This crate provides common functionality used across the Careline workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Participant identities shared by the messaging and conversation crates

pub mod config;
pub mod error;
pub mod identity;
pub mod state;

pub use error::{Error, Result};
pub use identity::Identity;
pub use state::StateError;
