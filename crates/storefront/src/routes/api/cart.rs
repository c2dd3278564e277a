//! Cart API handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use kandahar_core::SessionId;

use crate::error::Result;
use crate::models::CartItem;
use crate::state::AppState;

/// Query parameters for reading a cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub session_id: Option<String>,
}

/// Response body of the cart count endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub session_id: SessionId,
    pub count: i64,
}

/// `GET /api/cart?sessionId=` - the session's cart lines, oldest first.
#[instrument(skip(state))]
pub async fn items(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<Vec<CartItem>>> {
    let items = state.cart().items(query.session_id.as_deref()).await?;
    Ok(Json(items))
}

/// `GET /api/cart/count?sessionId=` - total quantity in the session's cart.
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<CartCount>> {
    let (session_id, count) = state.cart().count(query.session_id.as_deref()).await?;
    Ok(Json(CartCount { session_id, count }))
}

/// `POST /api/cart` - add a product to a cart.
///
/// Responds 201 when a new line is created and 200 when an existing line's
/// quantity was increased.
#[instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let upsert = state.cart().add(body).await?;
    let status = if upsert.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upsert.item)).into_response())
}
