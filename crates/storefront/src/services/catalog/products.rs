//! Product operations.

use serde_json::Value;
use tracing::instrument;

use kandahar_core::{ProductId, Slug};

use super::{CatalogService, write_error};
use crate::models::{NewProduct, Page, Product, ProductFilter, ProductPatch};
use crate::services::payload::{
    Payload, decode_age_range, decode_category_id, decode_featured, decode_images, decode_name,
    decode_optional_text, decode_price, decode_slug, decode_stock,
};
use crate::services::{Entity, ErrorCode, ServiceError};

impl CatalogService<'_> {
    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Product))
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product uses the slug.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ServiceError> {
        let slug = Slug::parse(slug).map_err(|_| ServiceError::NotFound(Entity::Product))?;
        self.store
            .get_product_by_slug(&slug)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Product))
    }

    /// List products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` on store failure.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products(filter).await?)
    }

    /// Products of the same category as `id`, excluding the product itself.
    ///
    /// A product without a category has no related products.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn related_products(
        &self,
        id: ProductId,
        page: Page,
    ) -> Result<Vec<Product>, ServiceError> {
        let product = self.get_product(id).await?;
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };

        let filter = ProductFilter {
            category_id: Some(category_id),
            exclude_id: Some(product.id),
            page,
            ..ProductFilter::default()
        };
        Ok(self.store.list_products(&filter).await?)
    }

    /// Create a product from a request body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing or malformed fields
    /// (including an unknown `categoryId`) and `ServiceError::Conflict` if the
    /// slug is taken.
    #[instrument(skip(self, body))]
    pub async fn create_product(&self, body: Value) -> Result<Product, ServiceError> {
        let new = decode_new_product(&Payload::from_value(body)?)?;
        let product = self
            .store
            .create_product(&new)
            .await
            .map_err(|e| write_error(Entity::Product, e))?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Apply a partial update from a request body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve,
    /// `ServiceError::Validation` for malformed supplied fields, and
    /// `ServiceError::Conflict` if the new slug is taken by another product.
    #[instrument(skip(self, body), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, body: Value) -> Result<Product, ServiceError> {
        self.get_product(id).await?;

        let patch = decode_product_patch(&Payload::from_value(body)?)?;
        self.store
            .update_product(id, &patch)
            .await
            .map_err(|e| write_error(Entity::Product, e))?
            .ok_or(ServiceError::NotFound(Entity::Product))
    }

    /// Delete a product and return its last state.
    ///
    /// Cart lines for the product are removed with it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, ServiceError> {
        let product = self
            .store
            .delete_product(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Product))?;

        tracing::info!(product_id = %id, slug = %product.slug, "Product deleted");
        Ok(product)
    }
}

fn decode_new_product(body: &Payload) -> Result<NewProduct, ErrorCode> {
    Ok(NewProduct {
        name: body
            .field("name")
            .required(ErrorCode::MissingName, |v| {
                decode_name(v, ErrorCode::MissingName)
            })?,
        slug: body
            .field("slug")
            .required(ErrorCode::MissingSlug, |v| {
                decode_slug(v, ErrorCode::MissingSlug)
            })?,
        price: body
            .field("price")
            .required(ErrorCode::MissingPrice, decode_price)?,
        description: body
            .field("description")
            .optional(|v| decode_optional_text(v, ErrorCode::InvalidDescription))?
            .flatten(),
        category_id: body
            .field("categoryId")
            .optional(decode_category_id)?
            .flatten(),
        image_url: body
            .field("imageUrl")
            .optional(|v| decode_optional_text(v, ErrorCode::InvalidImageUrl))?
            .flatten(),
        images: body.field("images").optional(decode_images)?,
        stock: body.field("stock").optional(decode_stock)?.unwrap_or(0),
        featured: body
            .field("featured")
            .optional(decode_featured)?
            .unwrap_or(false),
        age_range: body
            .field("ageRange")
            .optional(decode_age_range)?
            .flatten(),
    })
}

fn decode_product_patch(body: &Payload) -> Result<ProductPatch, ErrorCode> {
    Ok(ProductPatch {
        name: body
            .field("name")
            .non_null(ErrorCode::InvalidName, |v| {
                decode_name(v, ErrorCode::InvalidName)
            })?,
        slug: body
            .field("slug")
            .non_null(ErrorCode::InvalidSlug, |v| {
                decode_slug(v, ErrorCode::InvalidSlug)
            })?,
        description: body
            .field("description")
            .nullable(|v| decode_optional_text(v, ErrorCode::InvalidDescription))?,
        price: body
            .field("price")
            .non_null(ErrorCode::InvalidPrice, decode_price)?,
        category_id: body.field("categoryId").nullable(decode_category_id)?,
        image_url: body
            .field("imageUrl")
            .nullable(|v| decode_optional_text(v, ErrorCode::InvalidImageUrl))?,
        images: body
            .field("images")
            .nullable(|v| decode_images(v).map(Some))?,
        stock: body
            .field("stock")
            .non_null(ErrorCode::InvalidStock, decode_stock)?,
        featured: body
            .field("featured")
            .non_null(ErrorCode::InvalidFeatured, decode_featured)?,
        age_range: body
            .field("ageRange")
            .nullable(decode_age_range)?,
    })
}
