//! Messaging service configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::MessagingError;

const DEFAULT_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which side of a conversation the operator occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorRole {
    #[default]
    Doctor,
    Patient,
}

impl std::fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorRole::Doctor => write!(f, "doctor"),
            OperatorRole::Patient => write!(f, "patient"),
        }
    }
}

impl std::str::FromStr for OperatorRole {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(OperatorRole::Doctor),
            "patient" => Ok(OperatorRole::Patient),
            other => Err(MessagingError::Configuration(format!(
                "Unknown operator role: {}. Supported roles: doctor, patient",
                other
            ))),
        }
    }
}

/// Route paths of the messaging API, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingRoutes {
    /// `None` when the operator has no directory to browse
    pub list_counterparts: Option<String>,
    pub fetch_history: String,
    pub send_message: String,
}

impl MessagingRoutes {
    /// Route set used by a given operator role
    pub fn for_role(role: OperatorRole) -> Self {
        match role {
            OperatorRole::Doctor => Self {
                list_counterparts: Some("/api/getPatients".to_string()),
                fetch_history: "/api/getMessages".to_string(),
                send_message: "/api/sendMessage".to_string(),
            },
            OperatorRole::Patient => Self {
                list_counterparts: None,
                fetch_history: "/api/user/get-messages".to_string(),
                send_message: "/api/user/send-message".to_string(),
            },
        }
    }
}

/// Messaging service configuration
#[derive(Clone)]
pub struct MessagingConfig {
    /// Messaging provider (http, mock)
    pub provider: String,
    pub base_url: String,
    /// Sent as the `token` header when present
    pub auth_token: Option<String>,
    pub role: OperatorRole,
    pub routes: MessagingRoutes,
    pub timeout: Duration,
}

impl std::fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .field("routes", &self.routes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MessagingConfig {
    /// Configuration for the HTTP provider with the role's default routes
    pub fn http(base_url: impl Into<String>, role: OperatorRole) -> Self {
        Self {
            provider: "http".to_string(),
            base_url: base_url.into(),
            auth_token: None,
            role,
            routes: MessagingRoutes::for_role(role),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Configuration for the in-memory mock provider
    pub fn mock(role: OperatorRole) -> Self {
        Self {
            provider: "mock".to_string(),
            ..Self::http(DEFAULT_BASE_URL, role)
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Create messaging config from environment variables
    pub fn from_env() -> Result<Self, MessagingError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("MESSAGING_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let base_url =
            std::env::var("MESSAGING_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let auth_token = std::env::var("MESSAGING_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        let role = match std::env::var("MESSAGING_OPERATOR_ROLE") {
            Ok(raw) => raw.parse()?,
            Err(_) => OperatorRole::default(),
        };

        let timeout_secs = match std::env::var("MESSAGING_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                MessagingError::Configuration(format!(
                    "MESSAGING_TIMEOUT_SECS must be a whole number of seconds, got {}",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider,
            base_url,
            auth_token,
            role,
            routes: MessagingRoutes::for_role(role),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
