//! Kandahar Electronics storefront library.
//!
//! JSON API for the product catalog (categories, products) and session
//! carts, backed by `PostgreSQL` or an in-process store. This crate provides
//! the storefront functionality as a library, allowing it to be tested and
//! reused; the `kandahar-storefront` binary wires it to a listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router without rate limiting.
///
/// Used by tests and by embedders that limit requests upstream.
pub fn app(state: AppState) -> Router {
    build(state, routes::api::routes())
}

/// Build the application router with the per-IP limiter around `/api`.
///
/// The limiter falls back to the TCP peer address, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn rate_limited_app(state: AppState) -> Router {
    build(
        state,
        routes::api::routes().layer(middleware::api_rate_limiter()),
    )
}

fn build(state: AppState, api: Router<AppState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .nest("/api", api)
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::db::MemoryStore;

    fn memory_state() -> AppState {
        let config = StorefrontConfig::from_lookup(|key| {
            (key == "STOREFRONT_STORE").then(|| "memory".to_string())
        })
        .unwrap();
        AppState::new(config, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_with_headers() {
        let response = app(memory_state())
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-frame-options"));
    }

    #[tokio::test]
    async fn test_rate_limited_app_serves_keyed_requests() {
        let response = rate_limited_app(memory_state())
            .oneshot(
                Request::builder()
                    .uri("/api/categories")
                    .header("x-real-ip", "203.0.113.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
