//! Product API handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use kandahar_core::{CategoryId, ProductId, Slug};

use crate::error::Result;
use crate::models::{Page, ProductFilter, ProductSortKey, SortOrder};
use crate::services::{ErrorCode, ServiceError, parse_id};
use crate::state::AppState;

/// Default number of related products.
const RELATED_LIMIT: i64 = 4;

/// Query parameters for the product endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub featured: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ProductQuery {
    /// Build a list filter from the query string.
    ///
    /// `featured` is a filter whenever present: `true` selects featured
    /// products and any other value selects the rest.
    fn filter(&self) -> std::result::Result<ProductFilter, ServiceError> {
        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<CategoryId>()
                    .map_err(|_| ServiceError::Validation(ErrorCode::InvalidCategoryId))?,
            ),
        };

        Ok(ProductFilter {
            search: self.search.clone().filter(|s| !s.is_empty()),
            category_id,
            category_slug: self.category.as_deref().and_then(|s| Slug::parse(s).ok()),
            featured: self.featured.as_deref().map(|v| v == "true"),
            exclude_id: None,
            sort: ProductSortKey::parse(self.sort.as_deref()),
            order: SortOrder::parse(self.order.as_deref()),
            page: Page::from_query(self.limit.as_deref(), self.offset.as_deref()),
        })
    }
}

/// `GET /api/products` - one product by `id` or `slug`, otherwise a list.
#[instrument(skip(state))]
pub async fn get(State(state): State<AppState>, Query(query): Query<ProductQuery>) -> Result<Response> {
    let catalog = state.catalog();

    if let Some(raw) = query.id.as_deref() {
        let id: ProductId = parse_id(Some(raw))?;
        return Ok(Json(catalog.get_product(id).await?).into_response());
    }
    if let Some(slug) = query.slug.as_deref() {
        return Ok(Json(catalog.get_product_by_slug(slug).await?).into_response());
    }

    let products = catalog.list_products(&query.filter()?).await?;
    Ok(Json(products).into_response())
}

/// `GET /api/products/related?id=&limit=` - other products of the same category.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    let id: ProductId = parse_id(query.id.as_deref())?;
    let page = Page::from_query_with_default(query.limit.as_deref(), None, RELATED_LIMIT);
    let products = state.catalog().related_products(id, page).await?;
    Ok(Json(products).into_response())
}

/// `POST /api/products` - create a product.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let product = state.catalog().create_product(body).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

/// `PUT /api/products?id=` - partially update a product.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let id: ProductId = parse_id(query.id.as_deref())?;
    let Json(body) = payload?;
    let product = state.catalog().update_product(id, body).await?;
    Ok(Json(product).into_response())
}

/// `DELETE /api/products?id=` - delete a product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>> {
    let id: ProductId = parse_id(query.id.as_deref())?;
    let product = state.catalog().delete_product(id).await?;
    Ok(Json(json!({
        "message": "Product deleted successfully",
        "product": product,
    })))
}
