//! Integration tests for operation dispatch against a mock Singlebase endpoint.
//!
//! These verify request shape (method, headers, body), response normalization
//! and the local failure paths (validation, transport, timeout).

use serde_json::{Value, json};
use singlebase_rs::{ApiResult, Client, FailureKind};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT_PATH: &str = "/api/test";

fn client_for(server: &MockServer) -> Client {
    Client::builder("abc")
        .api_url(format!("{}{ENDPOINT_PATH}", server.uri()))
        .build()
        .expect("client should build")
}

async fn respond_once(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

async fn only_request(server: &MockServer) -> wiremock::Request {
    let mut requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert_eq!(requests.len(), 1, "exactly one request should be sent");
    requests.remove(0)
}

fn header_value<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_dispatch_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(header("x-api-key", "abc"))
        .and(header("x-sbc-sdk-client", "singlebase-rs"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"op": "ping"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"msg": "ok"},
            "meta": {"page": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.dispatch(&json!({"op": "ping"}), None, None).await;

    assert!(result.is_ok(), "unexpected failure: {result}");
    assert_eq!(result.status_code(), 200);
    assert_eq!(result.error(), "");
    assert_eq!(result.failure(), None);
    assert_eq!(result.get("msg", Value::Null).unwrap(), json!("ok"));
    assert_eq!(result.get_meta("page", Value::Null).unwrap(), json!(1));
}

#[tokio::test]
async fn test_dispatch_server_error() {
    let server = MockServer::start().await;
    respond_once(
        &server,
        ResponseTemplate::new(400).set_body_json(json!({"error": "Bad Request"})),
    )
    .await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "ping"}), None, None)
        .await;

    assert!(!result.is_ok());
    assert_eq!(result.status_code(), 400);
    assert_eq!(result.error(), "Bad Request");
    assert_eq!(result.failure(), Some(FailureKind::Server));
    assert!(result.failure().unwrap().reached_server());
    assert!(result.data().is_empty());
    assert!(result.meta().is_empty());
}

#[tokio::test]
async fn test_dispatch_server_error_without_message() {
    let server = MockServer::start().await;
    respond_once(
        &server,
        ResponseTemplate::new(404).set_body_json(json!({"detail": "nope"})),
    )
    .await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "db.find"}), None, None)
        .await;

    assert_eq!(result.status_code(), 404);
    assert_eq!(result.error(), "Unknown Error");
}

#[tokio::test]
async fn test_dispatch_success_keeps_status_and_defaults_missing_fields() {
    let server = MockServer::start().await;
    respond_once(&server, ResponseTemplate::new(201).set_body_json(json!({}))).await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "db.insert", "doc": {"a": 1}}), None, None)
        .await;

    assert!(result.is_ok());
    assert_eq!(result.status_code(), 201);
    assert!(result.data().is_empty());
    assert!(result.meta().is_empty());
}

#[tokio::test]
async fn test_dispatch_invalid_json_body() {
    let server = MockServer::start().await;
    respond_once(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
    )
    .await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "ping"}), None, None)
        .await;

    assert!(!result.is_ok());
    assert_eq!(result.status_code(), 500);
    assert_eq!(result.failure(), Some(FailureKind::Parse));
    assert!(result.error().contains("JSON parse error"));
}

#[tokio::test]
async fn test_dispatch_missing_op_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for payload in [
        json!({}),
        json!({"op": ""}),
        json!({"op": null}),
        json!({"op": 1}),
        json!("ping"),
    ] {
        let result = client.dispatch(&payload, None, None).await;
        assert!(!result.is_ok(), "payload: {payload}");
        assert_eq!(result.status_code(), 400);
        assert_eq!(result.error(), "INVALID_PAYLOAD: missing 'op'");
        assert_eq!(result.failure(), Some(FailureKind::Validation));
    }

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_header_precedence() {
    let server = MockServer::start().await;
    respond_once(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    let client = Client::builder("abc")
        .api_url(format!("{}{ENDPOINT_PATH}", server.uri()))
        .header("x-tenant", "client-default")
        .header("x-region", "eu")
        .header("Authorization", "Basic client")
        .build()
        .unwrap();

    let extra = HashMap::from([
        ("X-Tenant".to_string(), "per-call".to_string()),
        ("Authorization".to_string(), "Basic per-call".to_string()),
    ]);
    let result = client
        .dispatch(&json!({"op": "ping"}), Some(&extra), Some("session-token"))
        .await;
    assert!(result.is_ok());

    let request = only_request(&server).await;
    assert_eq!(header_value(&request, "x-tenant"), Some("per-call"));
    assert_eq!(header_value(&request, "x-region"), Some("eu"));
    assert_eq!(
        header_value(&request, "authorization"),
        Some("Bearer session-token")
    );
    assert_eq!(header_value(&request, "x-api-key"), Some("abc"));
    assert_eq!(header_value(&request, "x-sbc-sdk-client"), Some("singlebase-rs"));
}

#[tokio::test]
async fn test_no_authorization_without_token() {
    let server = MockServer::start().await;
    respond_once(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "ping"}), None, Some(""))
        .await;
    assert!(result.is_ok());

    let request = only_request(&server).await;
    assert!(request.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_request_builder_sends_payload_and_headers() {
    #[derive(serde::Serialize)]
    struct Insert<'a> {
        op: &'a str,
        collection: &'a str,
        document: Value,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(header("x-request-source", "tests"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "op": "db.insert",
            "collection": "users",
            "document": {"name": "Ada"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_key": "u1", "created_at": "2025-01-01T00:00:00Z"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .request(Insert {
            op: "db.insert",
            collection: "users",
            document: json!({"name": "Ada"}),
        })
        .with_header("x-request-source", "tests")
        .with_bearer_token("tok")
        .send()
        .await
        .into_std()
        .expect("dispatch should succeed");

    assert_eq!(result.get("_key", Value::Null).unwrap(), json!("u1"));
    assert!(result.get_timestamp("created_at").unwrap().is_some());
}

#[tokio::test]
async fn test_transport_failure() {
    // Nothing listens on the discard port.
    let client = Client::builder("abc")
        .api_url("http://127.0.0.1:9/api/test")
        .build()
        .unwrap();

    let result = client.dispatch(&json!({"op": "ping"}), None, None).await;

    assert!(!result.is_ok());
    assert_eq!(result.status_code(), 500);
    assert_eq!(result.failure(), Some(FailureKind::Transport));
    assert!(!result.failure().unwrap().reached_server());
    assert!(!result.error().is_empty());
}

#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = Client::builder("abc")
        .api_url(format!("{}{ENDPOINT_PATH}", server.uri()))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let result = client.dispatch(&json!({"op": "slow"}), None, None).await;

    assert_eq!(result.status_code(), 500);
    assert_eq!(result.failure(), Some(FailureKind::Transport));
}

#[tokio::test]
async fn test_concurrent_dispatches_share_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"msg": "ok"}})))
        .expect(8)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .dispatch(&json!({"op": "ping", "n": i}), None, None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result: ApiResult = handle.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(result.data()["msg"], "ok");
    }
}

#[tokio::test]
async fn test_result_external_representation() {
    let server = MockServer::start().await;
    respond_once(
        &server,
        ResponseTemplate::new(403).set_body_json(json!({"error": "Forbidden"})),
    )
    .await;

    let result = client_for(&server)
        .dispatch(&json!({"op": "ping"}), None, None)
        .await;

    assert_eq!(
        result.to_value(),
        json!({
            "data": {},
            "meta": {},
            "ok": false,
            "error": "Forbidden",
            "status_code": 403
        })
    );
}
