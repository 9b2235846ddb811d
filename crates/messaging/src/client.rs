//! Messaging HTTP Client Implementation
//!
//! POSTs JSON bodies to the messaging routes under `base_url` and decodes the
//! `{ success, message, ... }` envelope every route answers with.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use careline_common::Identity;

use crate::{
    Counterpart, FetchHistoryRequest, Message, MessagingConfig, MessagingError,
    MessagingRoutes, MessagingService, OperatorRole, SendMessageRequest,
};

const AUTH_HEADER: &str = "token";

/// Response keys carrying the counterpart list
const COUNTERPART_KEYS: &[&str] = &["counterparts", "patients"];

/// Response keys carrying the message history
const HISTORY_KEYS: &[&str] = &["messages"];

/// Response keys carrying the confirmed message
const CONFIRMED_KEYS: &[&str] = &["message", "chat"];

/// Real HTTP client for the messaging API.
pub struct HttpMessagingClient {
    http: reqwest::Client,
    base_url: String,
    routes: MessagingRoutes,
    role: OperatorRole,
    auth_token: Option<String>,
}

impl HttpMessagingClient {
    /// Create a new messaging client from configuration.
    pub fn new(config: MessagingConfig) -> Result<Self, MessagingError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MessagingError::Configuration(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            routes: config.routes,
            role: config.role,
            auth_token: config.auth_token,
        })
    }

    async fn post(&self, route: &str, body: Value) -> Result<Value, MessagingError> {
        let url = format!("{}{}", self.base_url, route);

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTH_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MessagingError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MessagingError::Transport(format!("Failed to read response body: {}", e)))?;

        let parsed = serde_json::from_str::<Value>(&text);

        if !status.is_success() {
            // A declined request may still carry a readable envelope
            if let Ok(value) = &parsed {
                if value.get("success").and_then(Value::as_bool) == Some(false) {
                    return Err(MessagingError::Application(failure_message(value)));
                }
            }
            return Err(MessagingError::Transport(format!(
                "Messaging API returned {}: {}",
                status, text
            )));
        }

        parsed.map_err(|e| MessagingError::Response(format!("Failed to parse response: {}", e)))
    }

    /// Request body for the history route; the backend keys it by patient and doctor.
    fn history_body(&self, request: &FetchHistoryRequest) -> Value {
        let (patient, doctor) = match self.role {
            OperatorRole::Doctor => (&request.counterpart_id, &request.operator_id),
            OperatorRole::Patient => (&request.operator_id, &request.counterpart_id),
        };
        json!({ "userId": patient, "doctorId": doctor })
    }
}

/// Unwrap a `{ success, ... }` envelope and decode the payload under the first matching key.
fn decode_envelope<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Result<T, MessagingError> {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => {}
        Some(false) => return Err(MessagingError::Application(failure_message(&value))),
        None => {
            return Err(MessagingError::Response(
                "Response is missing the success flag".to_string(),
            ))
        }
    }

    let mut failures = Vec::new();
    for key in keys {
        let Some(payload) = value.get(*key) else {
            continue;
        };
        match serde_json::from_value::<T>(payload.clone()) {
            Ok(decoded) => return Ok(decoded),
            Err(e) => failures.push(format!("{}: {}", key, e)),
        }
    }

    let cause = if failures.is_empty() {
        "no such key".to_string()
    } else {
        failures.join("; ")
    };
    Err(MessagingError::Response(format!(
        "Response has no decodable payload under {} ({})",
        keys.join(" or "),
        cause
    )))
}

fn failure_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Request was not successful")
        .to_string()
}

#[async_trait::async_trait]
impl MessagingService for HttpMessagingClient {
    async fn list_counterparts(
        &self,
        operator_id: &Identity,
    ) -> Result<Vec<Counterpart>, MessagingError> {
        let route = self.routes.list_counterparts.as_deref().ok_or_else(|| {
            MessagingError::Configuration(format!(
                "Listing counterparts is not available for {} operators",
                self.role
            ))
        })?;

        tracing::debug!(operator_id = %operator_id, "Requesting counterpart list");
        let value = self.post(route, json!({ "doctorId": operator_id })).await?;
        decode_envelope(value, COUNTERPART_KEYS)
    }

    async fn fetch_history(
        &self,
        request: FetchHistoryRequest,
    ) -> Result<Vec<Message>, MessagingError> {
        tracing::debug!(
            operator_id = %request.operator_id,
            counterpart_id = %request.counterpart_id,
            "Requesting conversation history"
        );
        let body = self.history_body(&request);
        let value = self.post(&self.routes.fetch_history, body).await?;
        decode_envelope(value, HISTORY_KEYS)
    }

    async fn send_message(&self, request: SendMessageRequest) -> Result<Message, MessagingError> {
        tracing::debug!(
            sender_id = %request.sender_id,
            receiver_id = %request.receiver_id,
            "Sending message"
        );
        let body = json!({
            "senderId": request.sender_id,
            "receiverId": request.receiver_id,
            "message": request.body,
        });
        let value = self.post(&self.routes.send_message, body).await?;
        decode_envelope(value, CONFIRMED_KEYS)
    }
}
