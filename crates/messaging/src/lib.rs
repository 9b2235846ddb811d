//! Careline Messaging Service
//!
//! Client side of the two-party messaging API:
//! - `MessagingService` trait: list counterparts, fetch history, send a message
//! - HTTP client for deployed backends, with per-role route presets
//! - Mock messaging service for testing and development

pub mod client;
pub mod config;
pub mod mock;
pub mod types;

use careline_common::Identity;
use thiserror::Error;

pub use config::{MessagingConfig, MessagingRoutes, OperatorRole};
pub use types::{Counterpart, Direction, FetchHistoryRequest, Message, SendMessageRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("Messaging configuration error: {0}")]
    Configuration(String),

    /// Network or connection failure, no usable response
    #[error("Messaging transport error: {0}")]
    Transport(String),

    /// Well-formed response reporting `success: false`
    #[error("{0}")]
    Application(String),

    /// Response arrived but could not be understood
    #[error("Messaging response error: {0}")]
    Response(String),
}

impl MessagingError {
    /// Whether the backend answered and declined the request
    pub fn is_application(&self) -> bool {
        matches!(self, MessagingError::Application(_))
    }
}

/// Messaging service trait for different backends
#[async_trait::async_trait]
pub trait MessagingService: Send + Sync {
    /// List the counterparts `operator_id` may converse with, in backend order.
    async fn list_counterparts(
        &self,
        operator_id: &Identity,
    ) -> Result<Vec<Counterpart>, MessagingError>;

    /// Fetch the full history between the operator and a counterpart.
    async fn fetch_history(
        &self,
        request: FetchHistoryRequest,
    ) -> Result<Vec<Message>, MessagingError>;

    /// Append a message; returns the message as confirmed by the backend.
    async fn send_message(&self, request: SendMessageRequest) -> Result<Message, MessagingError>;
}

/// Factory for creating MessagingService implementations
pub struct MessagingServiceFactory;

impl MessagingServiceFactory {
    pub fn create(config: MessagingConfig) -> Result<Box<dyn MessagingService>, MessagingError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(base_url = %config.base_url, role = %config.role, "Creating HTTP messaging service");
                Ok(Box::new(client::HttpMessagingClient::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock messaging service");
                Ok(Box::new(mock::MockMessagingService::new()))
            }
            provider => Err(MessagingError::Configuration(format!(
                "Unknown messaging provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
