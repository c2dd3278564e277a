//! Catalog service.
//!
//! Query and mutation operations for categories and products. Uniqueness
//! and reference checks are left to the store, which applies them in the
//! same atomic step as the write; the service maps the resulting
//! [`RepositoryError`] onto the [`ServiceError`] taxonomy.

mod categories;
mod products;

use crate::db::{RepositoryError, Store};

use super::{Entity, ErrorCode, ServiceError};

/// Category and product operations over a [`Store`].
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    /// Create a catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }
}

/// Map a failed catalog write onto the service taxonomy.
fn write_error(entity: Entity, err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::Conflict(entity),
        RepositoryError::NotFound => ServiceError::NotFound(entity),
        RepositoryError::InvalidReference(_) => {
            ServiceError::Validation(ErrorCode::InvalidCategoryId)
        }
        RepositoryError::OutOfRange(_) => match entity {
            Entity::Category => ServiceError::Internal(err),
            Entity::Product => ServiceError::Validation(ErrorCode::InvalidPrice),
        },
        RepositoryError::TooLong(_) => ServiceError::Validation(ErrorCode::ValueTooLong),
        other => ServiceError::Internal(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_mapping() {
        assert!(matches!(
            write_error(
                Entity::Product,
                RepositoryError::Conflict("products_slug_key".into())
            ),
            ServiceError::Conflict(Entity::Product)
        ));
        assert!(matches!(
            write_error(
                Entity::Product,
                RepositoryError::InvalidReference("products_category_id_fkey".into())
            ),
            ServiceError::Validation(ErrorCode::InvalidCategoryId)
        ));
        assert!(matches!(
            write_error(
                Entity::Category,
                RepositoryError::TooLong("character varying(255)".into())
            ),
            ServiceError::Validation(ErrorCode::ValueTooLong)
        ));
        assert!(matches!(
            write_error(
                Entity::Category,
                RepositoryError::DataCorruption("bad".into())
            ),
            ServiceError::Internal(_)
        ));
    }
}
