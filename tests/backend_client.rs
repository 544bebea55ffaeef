//! REST client tests against a wiremock backend
//!
//! Verifies the procedure and storage requests on the wire (paths, headers
//! and bodies) and how non-success responses surface as `BackendError`.

mod common;

use common::{backend_config, retention_config, TEST_SERVICE_KEY};
use consult_sweeper::backend::{ObjectStorage, RestBackendClient, RetentionBackend};
use consult_sweeper::retention::{AudioRetentionSweeper, SweepStage, SweepStatus};
use consult_sweeper::BackendError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RestBackendClient {
    RestBackendClient::new(&backend_config(&server.uri()), "list_expired_audio").unwrap()
}

fn bearer() -> String {
    format!("Bearer {}", TEST_SERVICE_KEY)
}

#[tokio::test]
async fn listing_calls_procedure_with_service_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .and(header("apikey", TEST_SERVICE_KEY))
        .and(header("authorization", bearer().as_str()))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted_count": 3,
            "deleted_files": ["a", "b", "c"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client(&server).list_expired_audio().await.unwrap();

    assert_eq!(listing.deleted_count, 3);
    assert_eq!(listing.paths(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn listing_accepts_single_row_array() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "deleted_count": 1,
            "deleted_files": [{"path": "user-1/consult-9.webm", "consultation_id": "consult-9"}]
        }])))
        .mount(&server)
        .await;

    let listing = client(&server).list_expired_audio().await.unwrap();

    assert_eq!(listing.paths(), vec!["user-1/consult-9.webm"]);
    assert_eq!(listing.deleted_files[0].consultation_id.as_deref(), Some("consult-9"));
}

#[tokio::test]
async fn listing_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(404).set_body_string("function not found"))
        .mount(&server)
        .await;

    let err = client(&server).list_expired_audio().await.unwrap_err();

    match err {
        BackendError::Status { status, ref body, .. } => {
            assert_eq!(status, 404);
            assert!(body.contains("function not found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).list_expired_audio().await.unwrap_err();
    assert!(matches!(err, BackendError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = RestBackendClient::new(&backend_config(&uri), "list_expired_audio").unwrap();
    let err = client.list_expired_audio().await.unwrap_err();

    assert!(matches!(err, BackendError::Transport { .. }));
}

#[tokio::test]
async fn remove_sends_prefixes_to_bucket() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/consultation-audio"))
        .and(header("apikey", TEST_SERVICE_KEY))
        .and(header("authorization", bearer().as_str()))
        .and(body_json(json!({"prefixes": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .remove("consultation-audio", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_failure_is_one_aggregate_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/consultation-audio"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .remove("consultation-audio", &["a".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.operation(), "remove");
    assert!(matches!(err, BackendError::Status { status: 500, .. }));
}

#[tokio::test]
async fn full_cycle_against_mock_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted_count": 3,
            "deleted_files": ["a", "b", "c"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/consultation-audio"))
        .and(body_json(json!({"prefixes": ["a", "b", "c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server));
    let sweeper = AudioRetentionSweeper::new(client.clone(), client, retention_config());

    let result = sweeper.run_once().await;

    assert_eq!(result.status, SweepStatus::Deleted);
    assert_eq!(result.deleted_count, 3);
}

#[tokio::test]
async fn listing_failure_sends_no_delete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server));
    let sweeper = AudioRetentionSweeper::new(client.clone(), client, retention_config());

    let result = sweeper.run_once().await;

    assert_eq!(result.status, SweepStatus::Failed);
    assert_eq!(result.error.map(|e| e.stage), Some(SweepStage::List));
}

#[tokio::test]
async fn null_file_list_is_a_noop_cycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/list_expired_audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted_count": 0,
            "deleted_files": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server));
    let sweeper = AudioRetentionSweeper::new(client.clone(), client, retention_config());

    let result = sweeper.run_once().await;

    assert_eq!(result.status, SweepStatus::NoOp);
    assert!(result.error.is_none());
}
