//! Integration tests for the Kandahar Electronics storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests against the in-memory store
//! cargo test -p kandahar-integration-tests
//!
//! # Include the PostgreSQL store tests
//! STOREFRONT_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p kandahar-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `categories_api` - Category CRUD, search, and pagination
//! - `products_api` - Product CRUD, filters, sorting, and related products
//! - `cart_api` - Cart upsert, listing, and counts
//! - `platform` - Health probes, request IDs, and security headers
//! - `postgres_store` - The `PostgreSQL` store against a live database

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use kandahar_core::ProductId;
use kandahar_storefront::config::StorefrontConfig;
use kandahar_storefront::db::MemoryStore;
use kandahar_storefront::state::AppState;

/// Upper bound on response bodies read by tests.
const BODY_LIMIT: usize = 1024 * 1024;

/// Response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The storefront router over a fresh in-memory store.
#[derive(Clone)]
pub struct TestServer {
    router: Router,
    store: MemoryStore,
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServer {
    /// Build a server with an empty catalog.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory configuration is rejected.
    #[must_use]
    pub fn new() -> Self {
        let config = StorefrontConfig::from_lookup(|key| {
            (key == "STOREFRONT_STORE").then(|| "memory".to_string())
        })
        .expect("in-memory configuration is valid");
        let store = MemoryStore::new();
        let state = AppState::new(config, Arc::new(store.clone()));

        Self {
            router: kandahar_storefront::app(state),
            store,
        }
    }

    /// Overwrite a product's stored gallery with raw text.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn corrupt_images(&self, id: i64, raw: &str) {
        let id = i32::try_from(id).expect("product id fits in i32");
        let updated = self
            .store
            .set_raw_images(ProductId::new(id), Some(raw.to_string()))
            .await;
        assert!(updated, "product {id} does not exist");
    }

    /// Send a request with an optional JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    /// Send a prebuilt request.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("Failed to read response body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a category and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the category is rejected.
    pub async fn create_category(&self, name: &str, slug: &str) -> i64 {
        let response = self
            .post(
                "/api/categories",
                &serde_json::json!({ "name": name, "slug": slug }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().expect("category id")
    }

    /// Create a product from a full JSON body and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the product is rejected.
    pub async fn create_product(&self, body: &Value) -> i64 {
        let response = self.post("/api/products", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().expect("product id")
    }
}

impl TestResponse {
    /// The `code` field of an error envelope.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }

    /// A response header as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body as an array.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a JSON array.
    #[must_use]
    pub fn array(&self) -> &[Value] {
        self.body
            .as_array()
            .map(Vec::as_slice)
            .expect("response body is an array")
    }
}
