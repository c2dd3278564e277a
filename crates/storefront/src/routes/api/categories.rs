//! Category API handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use kandahar_core::CategoryId;

use crate::error::Result;
use crate::models::{CategoryFilter, Page};
use crate::services::parse_id;
use crate::state::AppState;

/// Query parameters for the category endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl CategoryQuery {
    fn filter(&self) -> CategoryFilter {
        CategoryFilter {
            search: self.search.clone().filter(|s| !s.is_empty()),
            page: Page::from_query(self.limit.as_deref(), self.offset.as_deref()),
        }
    }
}

/// `GET /api/categories` - one category by `id` or `slug`, otherwise a list.
#[instrument(skip(state))]
pub async fn get(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> Result<Response> {
    let catalog = state.catalog();

    if let Some(raw) = query.id.as_deref() {
        let id: CategoryId = parse_id(Some(raw))?;
        return Ok(Json(catalog.get_category(id).await?).into_response());
    }
    if let Some(slug) = query.slug.as_deref() {
        return Ok(Json(catalog.get_category_by_slug(slug).await?).into_response());
    }

    let categories = catalog.list_categories(&query.filter()).await?;
    Ok(Json(categories).into_response())
}

/// `POST /api/categories` - create a category.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let category = state.catalog().create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// `PUT /api/categories?id=` - partially update a category.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let id: CategoryId = parse_id(query.id.as_deref())?;
    let Json(body) = payload?;
    let category = state.catalog().update_category(id, body).await?;
    Ok(Json(category).into_response())
}

/// `DELETE /api/categories?id=` - delete a category.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Value>> {
    let id: CategoryId = parse_id(query.id.as_deref())?;
    let category = state.catalog().delete_category(id).await?;
    Ok(Json(json!({
        "message": "Category deleted successfully",
        "category": category,
    })))
}
