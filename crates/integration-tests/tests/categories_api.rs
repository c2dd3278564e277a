//! Integration tests for the category API.
//!
//! Run with: cargo test -p kandahar-integration-tests

use axum::http::StatusCode;
use serde_json::json;

use kandahar_integration_tests::TestServer;

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_category() {
    let server = TestServer::new();

    let resp = server
        .post(
            "/api/categories",
            &json!({
                "name": "  WiFi  ",
                "slug": "wifi",
                "description": "Wireless routers",
                "imageUrl": "/img/wifi.jpg",
            }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["name"], "WiFi");
    assert_eq!(resp.body["slug"], "wifi");
    assert_eq!(resp.body["description"], "Wireless routers");
    assert_eq!(resp.body["imageUrl"], "/img/wifi.jpg");
    assert!(resp.body["id"].is_i64());
    assert!(resp.body["createdAt"].is_string());
}

#[tokio::test]
async fn test_duplicate_slug_rejected() {
    let server = TestServer::new();
    server.create_category("WiFi", "wifi").await;

    let resp = server
        .post("/api/categories", &json!({ "name": "WiFi 2", "slug": "wifi" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("DUPLICATE_SLUG"));
    assert_eq!(resp.body["error"], "A category with this slug already exists");

    // Padding and case do not make a slug distinct
    let resp = server
        .post("/api/categories", &json!({ "name": "WiFi 3", "slug": "  WIFI " }))
        .await;
    assert_eq!(resp.code(), Some("DUPLICATE_SLUG"));
}

#[tokio::test]
async fn test_create_requires_name_and_slug() {
    let server = TestServer::new();

    let resp = server
        .post("/api/categories", &json!({ "slug": "modems" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("MISSING_NAME"));

    let resp = server
        .post("/api/categories", &json!({ "name": "Modems", "slug": "   " }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("MISSING_SLUG"));
}

#[tokio::test]
async fn test_overlong_text_rejected() {
    let server = TestServer::new();

    let resp = server
        .post(
            "/api/categories",
            &json!({ "name": "n".repeat(300), "slug": "long-name" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_NAME"));

    // Lowercasing U+0130 doubles its length
    let resp = server
        .post(
            "/api/categories",
            &json!({ "name": "Dotted", "slug": "\u{130}".repeat(200) }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_SLUG"));

    let id = server.create_category("Modems", "modems").await;
    let resp = server
        .put(
            &format!("/api/categories?id={id}"),
            &json!({ "name": "n".repeat(256) }),
        )
        .await;
    assert_eq!(resp.code(), Some("INVALID_NAME"));

    assert_eq!(server.get("/api/categories").await.array().len(), 1);
    let resp = server.get(&format!("/api/categories?id={id}")).await;
    assert_eq!(resp.body["name"], "Modems");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let server = TestServer::new();

    let resp = server.post("/api/categories", &json!(["not", "an", "object"])).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_BODY"));
}

// ============================================================================
// Read & List
// ============================================================================

#[tokio::test]
async fn test_get_by_id_and_slug() {
    let server = TestServer::new();
    let id = server.create_category("Modems", "modems").await;

    let resp = server.get(&format!("/api/categories?id={id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["slug"], "modems");

    let resp = server.get("/api/categories?slug=modems").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["id"], id);
}

#[tokio::test]
async fn test_get_invalid_and_missing_id() {
    let server = TestServer::new();

    let resp = server.get("/api/categories?id=abc").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_ID"));

    let resp = server.get("/api/categories?id=999").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), Some("NOT_FOUND"));
    assert_eq!(resp.body["error"], "Category not found");
}

#[tokio::test]
async fn test_list_search_and_pagination() {
    let server = TestServer::new();
    for (name, slug) in [
        ("Access Points", "access-points"),
        ("Modems", "modems"),
        ("Network Cables", "network-cables"),
        ("Network Switches", "network-switches"),
    ] {
        server.create_category(name, slug).await;
    }

    let resp = server.get("/api/categories").await;
    assert_eq!(resp.status, StatusCode::OK);
    let names: Vec<_> = resp.array().iter().map(|c| c["name"].clone()).collect();
    assert_eq!(
        names,
        vec![
            json!("Access Points"),
            json!("Modems"),
            json!("Network Cables"),
            json!("Network Switches"),
        ]
    );

    let resp = server.get("/api/categories?search=Network").await;
    assert_eq!(resp.array().len(), 2);

    let first = server.get("/api/categories?limit=2&offset=0").await;
    let second = server.get("/api/categories?limit=2&offset=2").await;
    assert_eq!(first.array().len(), 2);
    assert_eq!(second.array().len(), 2);
    for item in first.array() {
        assert!(!second.array().contains(item));
    }
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let server = TestServer::new();
    server.create_category("Modems", "modems").await;
    server.create_category("Switches", "switches").await;

    // A zero limit still returns one row
    let resp = server.get("/api/categories?limit=0").await;
    assert_eq!(resp.array().len(), 1);

    let resp = server.get("/api/categories?limit=5000").await;
    assert_eq!(resp.array().len(), 2);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let server = TestServer::new();
    let resp = server
        .post(
            "/api/categories",
            &json!({ "name": "Modems", "slug": "modems", "description": "DSL and cable" }),
        )
        .await;
    let id = resp.body["id"].as_i64().expect("category id");

    let resp = server
        .put(
            &format!("/api/categories?id={id}"),
            &json!({ "name": "Cable Modems" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["name"], "Cable Modems");
    assert_eq!(resp.body["slug"], "modems");
    assert_eq!(resp.body["description"], "DSL and cable");
}

#[tokio::test]
async fn test_update_to_taken_slug() {
    let server = TestServer::new();
    server.create_category("Modems", "modems").await;
    let id = server.create_category("Switches", "switches").await;

    let resp = server
        .put(&format!("/api/categories?id={id}"), &json!({ "slug": "modems" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("DUPLICATE_SLUG"));

    // Keeping its own slug is not a conflict
    let resp = server
        .put(&format!("/api/categories?id={id}"), &json!({ "slug": "switches" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_missing_category() {
    let server = TestServer::new();

    let resp = server
        .put("/api/categories?id=42", &json!({ "name": "Ghost" }))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), Some("NOT_FOUND"));

    let resp = server
        .put("/api/categories", &json!({ "name": "Ghost" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), Some("INVALID_ID"));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_returns_snapshot() {
    let server = TestServer::new();
    let id = server.create_category("Modems", "modems").await;

    let resp = server.delete(&format!("/api/categories?id={id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Category deleted successfully");
    assert_eq!(resp.body["category"]["slug"], "modems");

    let resp = server.delete(&format!("/api/categories?id={id}")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_delete_detaches_products() {
    let server = TestServer::new();
    let category = server.create_category("Modems", "modems").await;
    let product = server
        .create_product(&json!({
            "name": "VDSL2 Modem",
            "slug": "vdsl2-modem",
            "price": 74.25,
            "categoryId": category,
        }))
        .await;

    server.delete(&format!("/api/categories?id={category}")).await;

    let resp = server.get(&format!("/api/products?id={product}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body["categoryId"].is_null());
}
