//! Shared fixtures for the messaging integration tests
//!
//! - Tracing set up once per test binary, writing through the test harness
//! - Stub messaging backend on a local `wiremock` server
//! - JSON builders shaped like the deployed backend's payloads

#![allow(dead_code)]

use std::sync::{Arc, Once};

use careline_common::Identity;
use careline_messaging::client::HttpMessagingClient;
use careline_messaging::{MessagingConfig, MessagingService, OperatorRole};
use serde_json::{json, Value};
use wiremock::MockServer;

static INIT: Once = Once::new();

pub const TEST_TOKEN: &str = "test-session-token"; // pragma: allowlist secret

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn id(s: &str) -> Identity {
    Identity::new(s).expect("test identity")
}

pub async fn start_backend() -> MockServer {
    init_tracing();
    MockServer::start().await
}

pub fn http_config(server: &MockServer, role: OperatorRole) -> MessagingConfig {
    MessagingConfig::http(server.uri(), role).with_auth_token(TEST_TOKEN)
}

pub fn http_client(server: &MockServer, role: OperatorRole) -> Arc<dyn MessagingService> {
    Arc::new(HttpMessagingClient::new(http_config(server, role)).expect("http client"))
}

/// Message as the legacy backend emits it: `message` body, epoch-millis `timestamp`
pub fn legacy_message(sender: &str, receiver: &str, body: &str, millis: i64) -> Value {
    json!({
        "senderId": sender,
        "receiverId": receiver,
        "message": body,
        "timestamp": millis,
    })
}

/// Message in the current field naming
pub fn message(sender: &str, receiver: &str, body: &str, sent_at: &str) -> Value {
    json!({
        "senderId": sender,
        "receiverId": receiver,
        "body": body,
        "sentAt": sent_at,
    })
}

pub fn history(messages: Vec<Value>) -> Value {
    json!({ "success": true, "messages": messages })
}
