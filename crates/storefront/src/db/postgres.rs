//! `PostgreSQL` store.
//!
//! Queries are built at runtime (`query_as` / `QueryBuilder`) because the
//! filter and patch shapes vary per request. Every value goes through a bind
//! parameter; only allow-listed column names and sort keywords are pushed as
//! SQL text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use kandahar_core::{CartItemId, CategoryId, Price, ProductId, SessionId, Slug};

use super::{CartRepo, CategoryRepo, ProductRepo, RepositoryError, Store, images};
use crate::models::{
    CartAdd, CartItem, CartUpsert, Category, CategoryFilter, CategoryPatch, NewCategory,
    NewProduct, Product, ProductFilter, ProductPatch,
};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image_url, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, category_id, image_url, \
     images, stock, featured, age_range, created_at, updated_at";

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// SQLSTATE for `string_data_right_truncation`.
const STRING_TOO_LONG: &str = "22001";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: Slug,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: Slug,
    description: Option<String>,
    price: Price,
    category_id: Option<CategoryId>,
    image_url: Option<String>,
    images: Option<String>,
    stock: i32,
    featured: bool,
    age_range: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let images = images::decode(row.images.as_deref(), row.id);
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            image_url: row.image_url,
            images,
            stock: row.stock,
            featured: row.featured,
            age_range: row.age_range,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    session_id: SessionId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartUpsertRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    inserted: bool,
}

/// Map write failures onto the repository taxonomy.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(constraint);
        }
        match db_err.code().as_deref() {
            Some(NUMERIC_OUT_OF_RANGE) => {
                return RepositoryError::OutOfRange(db_err.message().to_owned());
            }
            Some(STRING_TOO_LONG) => {
                return RepositoryError::TooLong(db_err.message().to_owned());
            }
            _ => {}
        }
    }
    RepositoryError::Database(e)
}

/// Build a `LIKE` pattern matching `needle` as a literal substring.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CategoryRepo for PgStore {
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories"
        ));

        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" WHERE (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR slug LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<CategoryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO categories (name, slug, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(slug) = &patch.slug {
            qb.push(", slug = ").push_bind(slug.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(image_url) = &patch.image_url {
            qb.push(", image_url = ").push_bind(image_url.clone());
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(CATEGORY_COLUMNS);

        let row = qb
            .build_query_as::<CategoryRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "DELETE FROM categories WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl ProductRepo for PgStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));

        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(slug) = &filter.category_slug {
            qb.push(" AND category_id = (SELECT id FROM categories WHERE slug = ")
                .push_bind(slug.clone())
                .push(")");
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(exclude_id) = filter.exclude_id {
            qb.push(" AND id <> ").push_bind(exclude_id);
        }

        let direction = filter.order.keyword();
        qb.push(format!(
            " ORDER BY {} {direction}, id {direction} LIMIT ",
            filter.sort.column()
        ))
        .push_bind(filter.page.limit())
        .push(" OFFSET ")
        .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let images = images::encode(new.images.as_deref())?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (
                name, slug, description, price, category_id,
                image_url, images, stock, featured, age_range
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.category_id)
        .bind(&new.image_url)
        .bind(images)
        .bind(new.stock)
        .bind(new.featured)
        .bind(&new.age_range)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(slug) = &patch.slug {
            qb.push(", slug = ").push_bind(slug.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(price) = patch.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if let Some(image_url) = &patch.image_url {
            qb.push(", image_url = ").push_bind(image_url.clone());
        }
        if let Some(images) = &patch.images {
            qb.push(", images = ")
                .push_bind(images::encode(images.as_deref())?);
        }
        if let Some(stock) = patch.stock {
            qb.push(", stock = ").push_bind(stock);
        }
        if let Some(featured) = patch.featured {
            qb.push(", featured = ").push_bind(featured);
        }
        if let Some(age_range) = &patch.age_range {
            qb.push(", age_range = ").push_bind(age_range.clone());
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PRODUCT_COLUMNS);

        let row = qb
            .build_query_as::<ProductRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl CartRepo for PgStore {
    async fn add_cart_item(&self, add: &CartAdd) -> Result<CartUpsert, RepositoryError> {
        // xmax is 0 only for a freshly inserted tuple
        let row = sqlx::query_as::<_, CartUpsertRow>(
            r"
            INSERT INTO cart_items (session_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING id, session_id, product_id, quantity, created_at,
                      (xmax = 0) AS inserted
            ",
        )
        .bind(&add.session_id)
        .bind(add.product_id)
        .bind(add.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(CartUpsert {
            item: row.item.into(),
            created: row.inserted,
        })
    }

    async fn list_cart_items(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, session_id, product_id, quantity, created_at
            FROM cart_items
            WHERE session_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
