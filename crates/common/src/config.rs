//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Error, Result};
use crate::identity::Identity;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity of the participant driving the session
    pub operator_id: Identity,

    /// Counterpart to open directly, skipping the directory
    pub counterpart_id: Option<Identity>,

    /// Runtime configuration
    pub log_format: LogFormat,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let operator_id = env::var("OPERATOR_ID")
            .map_err(|_| Error::Configuration("OPERATOR_ID is required".to_string()))
            .and_then(Identity::new)?;

        let counterpart_id = match env::var("COUNTERPART_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(Identity::new(raw)?),
            _ => None,
        };

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => {
                return Err(Error::Configuration(format!(
                    "Unknown LOG_FORMAT: {}. Supported formats: pretty, json",
                    other
                )))
            }
        };

        Ok(Self {
            operator_id,
            counterpart_id,
            log_format,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "careline=debug".to_string()),
        })
    }
}
