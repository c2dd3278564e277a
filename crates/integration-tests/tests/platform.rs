//! Integration tests for health probes and the middleware stack.
//!
//! Run with: cargo test -p kandahar-integration-tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};

use kandahar_integration_tests::TestServer;

#[tokio::test]
async fn test_health_probes() {
    let server = TestServer::new();

    let resp = server.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!("ok"));

    let resp = server.get("/health/ready").await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_generated() {
    let server = TestServer::new();

    let resp = server.get("/health").await;
    let id = resp.header("x-request-id").expect("request id header");
    assert_eq!(id.len(), 36, "expected a UUID, got {id}");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let server = TestServer::new();

    let request = Request::builder()
        .uri("/api/categories")
        .header("x-request-id", "edge-7f3a9c")
        .body(Body::empty())
        .expect("Failed to build request");
    let resp = server.send(request).await;
    assert_eq!(resp.header("x-request-id"), Some("edge-7f3a9c"));

    // Unprintable upstream ids are replaced
    let request = Request::builder()
        .uri("/api/categories")
        .header("x-request-id", "has spaces")
        .body(Body::empty())
        .expect("Failed to build request");
    let resp = server.send(request).await;
    assert_ne!(resp.header("x-request-id"), Some("has spaces"));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let server = TestServer::new();

    for resp in [
        server.get("/health").await,
        server.get("/api/products").await,
        server.get("/api/products?id=404").await,
    ] {
        assert_eq!(resp.header("x-frame-options"), Some("DENY"));
        assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(resp.header("cache-control"), Some("no-store, max-age=0"));
        assert!(
            resp.header("content-security-policy")
                .is_some_and(|csp| csp.starts_with("default-src 'none'"))
        );
    }
}

#[tokio::test]
async fn test_error_envelope_shape() {
    let server = TestServer::new();

    let resp = server.get("/api/products?id=404").await;
    let Value::Object(fields) = &resp.body else {
        panic!("expected an object, got {}", resp.body);
    };
    let mut keys: Vec<_> = fields.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["code".to_string(), "error".to_string()]);
    assert_eq!(resp.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_unparseable_json_body() {
    let server = TestServer::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"R1\","))
        .expect("Failed to build request");
    let resp = server.send(request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_BODY"));

    let request = Request::builder()
        .method("POST")
        .uri("/api/cart")
        .body(Body::from("sessionId=s1"))
        .expect("Failed to build request");
    let resp = server.send(request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_BODY"));
}
