//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kandahar_core::{CartItemId, ProductId, SessionId};

/// One line of a session's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Validated add-to-cart request. `quantity` is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartAdd {
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Outcome of an add-to-cart upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpsert {
    pub item: CartItem,
    /// `true` when a new line was inserted, `false` when an existing line's
    /// quantity was accumulated.
    pub created: bool,
}
