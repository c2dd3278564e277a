//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`catalog`] - Category and product queries and mutations
//! - [`cart`] - Session cart upsert and listing
//!
//! Services borrow a [`Store`](crate::db::Store) and return
//! [`ServiceError`] from every operation; the HTTP layer maps that single
//! error type onto status codes.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod payload;

use std::str::FromStr;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{Entity, ErrorCode, ServiceError};

/// Parse a single-entity id from a query parameter.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidId` if the value is missing or not an integer.
pub fn parse_id<T: FromStr>(raw: Option<&str>) -> Result<T, ServiceError> {
    raw.and_then(|value| value.parse().ok())
        .ok_or(ServiceError::Validation(ErrorCode::InvalidId))
}

#[cfg(test)]
mod tests {
    use kandahar_core::ProductId;

    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(
            parse_id::<ProductId>(Some("12")).ok(),
            Some(ProductId::new(12))
        );
        for raw in [None, Some(""), Some("abc"), Some("1.5"), Some("12abc")] {
            assert!(matches!(
                parse_id::<ProductId>(raw),
                Err(ServiceError::Validation(ErrorCode::InvalidId))
            ));
        }
    }
}
