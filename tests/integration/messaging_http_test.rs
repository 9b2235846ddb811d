//! HTTP messaging client against a stub backend
//!
//! Covers route selection per operator role, the auth header, request body
//! shapes, envelope decoding (including legacy field names), and the mapping
//! of each failure kind onto `MessagingError`.

use std::time::Duration;

use careline_messaging::client::HttpMessagingClient;
use careline_messaging::{
    FetchHistoryRequest, MessagingConfig, MessagingError, MessagingService, OperatorRole,
    SendMessageRequest,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod common;

use common::{http_client, id, legacy_message, message, start_backend, TEST_TOKEN};

#[tokio::test]
async fn test_doctor_lists_patients() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getPatients"))
        .and(header("token", TEST_TOKEN))
        .and(body_json(json!({ "doctorId": "doc1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "patients": [
                { "_id": "pat9", "name": "Zoe" },
                { "id": "pat7", "displayName": "Ada" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let patients = api.list_counterparts(&id("doc1")).await.unwrap();

    assert_eq!(patients.len(), 2);
    assert_eq!(patients[0].id, id("pat9"));
    assert_eq!(patients[0].display_name, "Zoe");
    assert_eq!(patients[1].display_name, "Ada");
}

#[tokio::test]
async fn test_patient_cannot_list_counterparts() {
    let server = start_backend().await;
    let api = http_client(&server, OperatorRole::Patient);

    let err = api.list_counterparts(&id("pat7")).await.unwrap_err();

    assert!(matches!(err, MessagingError::Configuration(_)));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_doctor_fetches_history_with_legacy_fields() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getMessages"))
        .and(header("token", TEST_TOKEN))
        .and(body_json(json!({ "userId": "pat7", "doctorId": "doc1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messages": [
                legacy_message("pat7", "doc1", "hi", 1_714_555_800_000),
                message("doc1", "pat7", "hello", "2024-05-01T09:31:00Z"),
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let messages = api
        .fetch_history(FetchHistoryRequest {
            counterpart_id: id("pat7"),
            operator_id: id("doc1"),
        })
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].body, "hi");
    assert_eq!(
        messages[0].sent_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    );
    assert_eq!(messages[1].sender_id, id("doc1"));
    assert_eq!(
        messages[1].sent_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap()
    );
}

#[tokio::test]
async fn test_patient_fetches_history_on_user_route() {
    let server = start_backend().await;
    // Same body shape as the doctor route: keyed by patient and doctor, not by operator
    Mock::given(method("POST"))
        .and(path("/api/user/get-messages"))
        .and(body_json(json!({ "userId": "pat7", "doctorId": "doc1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messages": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Patient);
    let messages = api
        .fetch_history(FetchHistoryRequest {
            counterpart_id: id("doc1"),
            operator_id: id("pat7"),
        })
        .await
        .unwrap();

    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_doctor_send_returns_confirmed_message() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/sendMessage"))
        .and(header("token", TEST_TOKEN))
        .and(body_json(json!({
            "senderId": "doc1",
            "receiverId": "pat7",
            "message": "hello",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "chat": legacy_message("doc1", "pat7", "hello", 1_714_555_860_000),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let confirmed = api
        .send_message(SendMessageRequest {
            sender_id: id("doc1"),
            receiver_id: id("pat7"),
            body: "hello".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(confirmed.body, "hello");
    assert_eq!(confirmed.receiver_id, id("pat7"));
    assert_eq!(
        confirmed.sent_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap()
    );
}

#[tokio::test]
async fn test_patient_send_confirmation_under_message_key() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/user/send-message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": message("pat7", "doc1", "thanks", "2024-05-01T10:00:00Z"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Patient);
    let confirmed = api
        .send_message(SendMessageRequest {
            sender_id: id("pat7"),
            receiver_id: id("doc1"),
            body: "thanks".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(confirmed.sender_id, id("pat7"));
    assert_eq!(confirmed.body, "thanks");
}

#[tokio::test]
async fn test_no_token_header_without_auth_token() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getMessages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messages": [],
        })))
        .mount(&server)
        .await;

    let config = MessagingConfig::http(server.uri(), OperatorRole::Doctor);
    let api = HttpMessagingClient::new(config).unwrap();
    api.fetch_history(FetchHistoryRequest {
        counterpart_id: id("pat7"),
        operator_id: id("doc1"),
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("token").is_none());
}

#[tokio::test]
async fn test_failure_envelope_is_application_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getMessages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Unauthorized",
        })))
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let err = api
        .fetch_history(FetchHistoryRequest {
            counterpart_id: id("pat7"),
            operator_id: id("doc1"),
        })
        .await
        .unwrap_err();

    assert_eq!(err, MessagingError::Application("Unauthorized".to_string()));
}

#[tokio::test]
async fn test_error_status_with_envelope_is_application_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/sendMessage"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Session expired",
        })))
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let err = api
        .send_message(SendMessageRequest {
            sender_id: id("doc1"),
            receiver_id: id("pat7"),
            body: "hello".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, MessagingError::Application("Session expired".to_string()));
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getPatients"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let err = api.list_counterparts(&id("doc1")).await.unwrap_err();

    match err {
        MessagingError::Transport(text) => assert!(text.contains("500")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_response_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getMessages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let err = api
        .fetch_history(FetchHistoryRequest {
            counterpart_id: id("pat7"),
            operator_id: id("doc1"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MessagingError::Response(_)));
}

#[tokio::test]
async fn test_missing_success_flag_is_response_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getMessages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let api = http_client(&server, OperatorRole::Doctor);
    let err = api
        .fetch_history(FetchHistoryRequest {
            counterpart_id: id("pat7"),
            operator_id: id("doc1"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MessagingError::Response(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out_as_transport_error() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/getPatients"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "patients": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut config = common::http_config(&server, OperatorRole::Doctor);
    config.timeout = Duration::from_millis(50);
    let api = HttpMessagingClient::new(config).unwrap();

    let err = api.list_counterparts(&id("doc1")).await.unwrap_err();
    assert!(matches!(err, MessagingError::Transport(_)));
}
