//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                   - Liveness check
//! GET    /health/ready             - Readiness check (store reachable)
//!
//! # Categories
//! GET    /api/categories           - List (?search, ?limit, ?offset) or one (?id, ?slug)
//! POST   /api/categories           - Create
//! PUT    /api/categories?id=       - Partial update
//! DELETE /api/categories?id=       - Delete
//!
//! # Products
//! GET    /api/products             - List (?search, ?category, ?categoryId, ?featured,
//!                                    ?sort, ?order, ?limit, ?offset) or one (?id, ?slug)
//! GET    /api/products/related     - Same-category products (?id, ?limit)
//! POST   /api/products             - Create
//! PUT    /api/products?id=         - Partial update
//! DELETE /api/products?id=         - Delete
//!
//! # Cart
//! GET    /api/cart?sessionId=      - Cart lines
//! GET    /api/cart/count?sessionId= - Total quantity
//! POST   /api/cart                 - Add (accumulates quantity)
//! ```

pub mod api;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
