//! Storage layer for the catalog and carts.
//!
//! # Tables
//!
//! - `categories` - Product categories (unique `slug`)
//! - `products` - Catalog products (unique `slug`, nullable `category_id`)
//! - `cart_items` - Cart lines keyed by `(session_id, product_id)`
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryStore`] - Process-local tables (local development and tests)
//!
//! Both backends honor the same contract: slug conflicts and cart
//! accumulation are resolved atomically inside the store, never by a
//! separate read followed by a write.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p kandahar-cli -- migrate
//! ```

pub mod images;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use kandahar_core::{CategoryId, ProductId, SessionId, Slug};

use crate::models::{
    CartAdd, CartItem, CartUpsert, Category, CategoryFilter, CategoryPatch, NewCategory,
    NewProduct, Product, ProductFilter, ProductPatch,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A numeric value does not fit its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// A string value is longer than its column allows.
    #[error("value too long: {0}")]
    TooLong(String),
}

/// Category persistence.
#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// Get a category by ID.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Get a category by slug.
    async fn get_category_by_slug(&self, slug: &Slug)
    -> Result<Option<Category>, RepositoryError>;

    /// List categories matching `filter`, ordered by name then id.
    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, RepositoryError>;

    /// Insert a category.
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError>;

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// Returns `Ok(None)` if the category does not exist and
    /// `RepositoryError::Conflict` if the new slug is taken.
    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Delete a category and return its last state.
    ///
    /// Products in the category keep existing with `category_id = NULL`.
    async fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
}

/// Product persistence.
#[async_trait]
pub trait ProductRepo: Send + Sync {
    /// Get a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Get a product by slug.
    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError>;

    /// List products matching `filter` in its requested order.
    async fn list_products(&self, filter: &ProductFilter)
    -> Result<Vec<Product>, RepositoryError>;

    /// Insert a product.
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken and
    /// `RepositoryError::InvalidReference` if the category does not exist.
    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// Returns `Ok(None)` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product (and its cart lines) and return its last state.
    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Cart persistence.
#[async_trait]
pub trait CartRepo: Send + Sync {
    /// Insert a cart line, or add to the quantity of the existing line for
    /// the same `(session_id, product_id)`, as one atomic operation.
    ///
    /// Returns `RepositoryError::InvalidReference` if the product does not
    /// exist and `RepositoryError::OutOfRange` if the accumulated quantity
    /// overflows.
    async fn add_cart_item(&self, add: &CartAdd) -> Result<CartUpsert, RepositoryError>;

    /// List a session's cart lines, oldest first.
    async fn list_cart_items(&self, session_id: &SessionId)
    -> Result<Vec<CartItem>, RepositoryError>;
}

/// Combined storage trait used by the services.
#[async_trait]
pub trait Store: CategoryRepo + ProductRepo + CartRepo + Send + Sync {
    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
