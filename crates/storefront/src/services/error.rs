//! Service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Catalog entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    Product,
}

impl Entity {
    /// Human-readable entity name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Product => "Product",
        }
    }
}

/// Machine-readable validation failure, one per rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidBody,
    InvalidId,
    MissingName,
    InvalidName,
    MissingSlug,
    InvalidSlug,
    MissingPrice,
    InvalidPrice,
    InvalidDescription,
    InvalidImageUrl,
    InvalidImages,
    InvalidStock,
    InvalidFeatured,
    InvalidAgeRange,
    InvalidCategoryId,
    MissingSessionId,
    MissingProductId,
    InvalidProductId,
    InvalidQuantity,
    ValueTooLong,
}

impl ErrorCode {
    /// Wire code, e.g. `MISSING_NAME`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidBody => "INVALID_BODY",
            Self::InvalidId => "INVALID_ID",
            Self::MissingName => "MISSING_NAME",
            Self::InvalidName => "INVALID_NAME",
            Self::MissingSlug => "MISSING_SLUG",
            Self::InvalidSlug => "INVALID_SLUG",
            Self::MissingPrice => "MISSING_PRICE",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::InvalidDescription => "INVALID_DESCRIPTION",
            Self::InvalidImageUrl => "INVALID_IMAGE_URL",
            Self::InvalidImages => "INVALID_IMAGES",
            Self::InvalidStock => "INVALID_STOCK",
            Self::InvalidFeatured => "INVALID_FEATURED",
            Self::InvalidAgeRange => "INVALID_AGE_RANGE",
            Self::InvalidCategoryId => "INVALID_CATEGORY_ID",
            Self::MissingSessionId => "MISSING_SESSION_ID",
            Self::MissingProductId => "MISSING_PRODUCT_ID",
            Self::InvalidProductId => "INVALID_PRODUCT_ID",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::ValueTooLong => "VALUE_TOO_LONG",
        }
    }

    /// Message shown to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidBody => "Request body must be a JSON object",
            Self::InvalidId => "A valid numeric id is required",
            Self::MissingName => "Name is required",
            Self::InvalidName => "Name must be a non-empty string of at most 255 characters",
            Self::MissingSlug => "Slug is required",
            Self::InvalidSlug => "Slug must be a non-empty string of at most 255 characters",
            Self::MissingPrice => "Price is required",
            Self::InvalidPrice => "Price must be a non-negative number",
            Self::InvalidDescription => "Description must be a string",
            Self::InvalidImageUrl => "Image URL must be a string",
            Self::InvalidImages => "Images must be a list of URL strings",
            Self::InvalidStock => "Stock must be an integer",
            Self::InvalidFeatured => "Featured must be a boolean",
            Self::InvalidAgeRange => "Age range must be a string of at most 100 characters",
            Self::InvalidCategoryId => "Category does not exist",
            Self::MissingSessionId => "Session ID is required",
            Self::MissingProductId => "Product ID is required",
            Self::InvalidProductId => "Product ID must be an integer",
            Self::InvalidQuantity => "Quantity must be a positive integer",
            Self::ValueTooLong => "A text field exceeds its maximum length",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by every catalog and cart operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input was missing or malformed. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(ErrorCode),

    /// The id or slug does not resolve.
    #[error("{} not found", .0.name())]
    NotFound(Entity),

    /// Another entity already uses the slug.
    #[error("{} slug already exists", .0.name())]
    Conflict(Entity),

    /// Unexpected storage failure.
    #[error("repository error: {0}")]
    Internal(#[from] RepositoryError),
}

impl ServiceError {
    /// Wire code for the error envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(code) => code.as_str(),
            Self::NotFound(Entity::Category) => "NOT_FOUND",
            Self::NotFound(Entity::Product) => "PRODUCT_NOT_FOUND",
            Self::Conflict(_) => "DUPLICATE_SLUG",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message for the error envelope. Internal details are never included.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(code) => code.message(),
            Self::NotFound(Entity::Category) => "Category not found",
            Self::NotFound(Entity::Product) => "Product not found",
            Self::Conflict(Entity::Category) => "A category with this slug already exists",
            Self::Conflict(Entity::Product) => "Slug must be unique",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        Self::Validation(code)
    }
}
