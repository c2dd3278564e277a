//! Cart service.
//!
//! Carts are scoped by a client-generated [`SessionId`]; there is no
//! server-side session. Adding a product that is already in the cart adds to
//! its quantity instead of creating a second line.

use serde_json::Value;
use tracing::instrument;

use kandahar_core::SessionId;

use super::payload::{Payload, decode_product_id, decode_quantity, decode_session_id};
use super::{Entity, ErrorCode, ServiceError};
use crate::db::{RepositoryError, Store};
use crate::models::{CartAdd, CartItem, CartUpsert};

/// Quantity used when an add-to-cart request does not supply one.
const DEFAULT_QUANTITY: i32 = 1;

/// Cart operations over a [`Store`].
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add a product to a session's cart from a request body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing session or product id
    /// or a non-positive quantity (including an accumulated quantity that no
    /// longer fits), and `ServiceError::NotFound` if the product does not
    /// exist.
    #[instrument(skip(self, body))]
    pub async fn add(&self, body: Value) -> Result<CartUpsert, ServiceError> {
        let add = decode_cart_add(&Payload::from_value(body)?)?;

        let upsert = self.store.add_cart_item(&add).await.map_err(|e| match e {
            RepositoryError::InvalidReference(_) => ServiceError::NotFound(Entity::Product),
            RepositoryError::OutOfRange(_) => ServiceError::Validation(ErrorCode::InvalidQuantity),
            other => ServiceError::Internal(other),
        })?;

        tracing::info!(
            session_id = %add.session_id,
            product_id = %add.product_id,
            quantity = upsert.item.quantity,
            created = upsert.created,
            "Cart line saved"
        );
        Ok(upsert)
    }

    /// List a session's cart lines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::MissingSessionId` if the session is missing or
    /// blank.
    #[instrument(skip(self))]
    pub async fn items(&self, session_id: Option<&str>) -> Result<Vec<CartItem>, ServiceError> {
        let session_id = parse_session(session_id)?;
        Ok(self.store.list_cart_items(&session_id).await?)
    }

    /// Total quantity across a session's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::MissingSessionId` if the session is missing or
    /// blank.
    #[instrument(skip(self))]
    pub async fn count(&self, session_id: Option<&str>) -> Result<(SessionId, i64), ServiceError> {
        let session_id = parse_session(session_id)?;
        let count = self
            .store
            .list_cart_items(&session_id)
            .await?
            .iter()
            .map(|item| i64::from(item.quantity))
            .sum();
        Ok((session_id, count))
    }
}

fn parse_session(raw: Option<&str>) -> Result<SessionId, ServiceError> {
    raw.and_then(|value| SessionId::parse(value).ok())
        .ok_or(ServiceError::Validation(ErrorCode::MissingSessionId))
}

fn decode_cart_add(body: &Payload) -> Result<CartAdd, ErrorCode> {
    Ok(CartAdd {
        session_id: body
            .field("sessionId")
            .required(ErrorCode::MissingSessionId, decode_session_id)?,
        product_id: body
            .field("productId")
            .required(ErrorCode::MissingProductId, decode_product_id)?,
        quantity: body
            .field("quantity")
            .non_null(ErrorCode::InvalidQuantity, decode_quantity)?
            .unwrap_or(DEFAULT_QUANTITY),
    })
}
