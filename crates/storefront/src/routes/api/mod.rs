//! JSON API consumed by the storefront pages.

pub mod cart;
pub mod categories;
pub mod products;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::get)
                .post(categories::create)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/products",
            get(products::get)
                .post(products::create)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/related", get(products::related))
        .route("/cart", get(cart::items).post(cart::add))
        .route("/cart/count", get(cart::count))
}
