//! Category operations.

use serde_json::Value;
use tracing::instrument;

use kandahar_core::{CategoryId, Slug};

use super::{CatalogService, write_error};
use crate::models::{Category, CategoryFilter, CategoryPatch, NewCategory};
use crate::services::payload::{
    Payload, decode_name, decode_optional_text, decode_slug,
};
use crate::services::{Entity, ErrorCode, ServiceError};

impl CatalogService<'_> {
    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.store
            .get_category(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Category))
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no category uses the slug.
    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, ServiceError> {
        let slug = Slug::parse(slug).map_err(|_| ServiceError::NotFound(Entity::Category))?;
        self.store
            .get_category_by_slug(&slug)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Category))
    }

    /// List categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Internal` on store failure.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories(filter).await?)
    }

    /// Create a category from a request body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing or malformed fields and
    /// `ServiceError::Conflict` if the slug is taken.
    #[instrument(skip(self, body))]
    pub async fn create_category(&self, body: Value) -> Result<Category, ServiceError> {
        let new = decode_new_category(&Payload::from_value(body)?)?;
        let category = self
            .store
            .create_category(&new)
            .await
            .map_err(|e| write_error(Entity::Category, e))?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Apply a partial update from a request body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve,
    /// `ServiceError::Validation` for malformed supplied fields, and
    /// `ServiceError::Conflict` if the new slug is taken by another category.
    #[instrument(skip(self, body), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        body: Value,
    ) -> Result<Category, ServiceError> {
        self.get_category(id).await?;

        let patch = decode_category_patch(&Payload::from_value(body)?)?;
        self.store
            .update_category(id, &patch)
            .await
            .map_err(|e| write_error(Entity::Category, e))?
            .ok_or(ServiceError::NotFound(Entity::Category))
    }

    /// Delete a category and return its last state.
    ///
    /// Products of the category are kept with no category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the id does not resolve.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<Category, ServiceError> {
        let category = self
            .store
            .delete_category(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Category))?;

        tracing::info!(category_id = %id, slug = %category.slug, "Category deleted");
        Ok(category)
    }
}

fn decode_new_category(body: &Payload) -> Result<NewCategory, ErrorCode> {
    Ok(NewCategory {
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
        description: body
            .field("description")
            .optional(|v| decode_optional_text(v, ErrorCode::InvalidDescription))?
            .flatten(),
        image_url: body
            .field("imageUrl")
            .optional(|v| decode_optional_text(v, ErrorCode::InvalidImageUrl))?
            .flatten(),
    })
}

fn decode_category_patch(body: &Payload) -> Result<CategoryPatch, ErrorCode> {
    Ok(CategoryPatch {
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
        image_url: body
            .field("imageUrl")
            .nullable(|v| decode_optional_text(v, ErrorCode::InvalidImageUrl))?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_create_trims_and_normalizes() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let category = catalog
            .create_category(json!({"name": "  WiFi ", "slug": " WiFi ", "description": ""}))
            .await
            .unwrap();
        assert_eq!(category.name, "WiFi");
        assert_eq!(category.slug.as_str(), "wifi");
        assert_eq!(category.description, None);
    }

    #[tokio::test]
    async fn test_create_requires_name_then_slug() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let err = catalog.create_category(json!({"slug": "wifi"})).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_NAME");

        let err = catalog.create_category(json!({"name": "WiFi", "slug": "  "})).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_SLUG");
    }

    #[tokio::test]
    async fn test_duplicate_slug_ignores_case_and_padding() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        catalog
            .create_category(json!({"name": "WiFi", "slug": "wifi"}))
            .await
            .unwrap();

        let err = catalog
            .create_category(json!({"name": "Other", "slug": " WIFI "}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(Entity::Category)));
        assert_eq!(err.code(), "DUPLICATE_SLUG");
    }

    #[tokio::test]
    async fn test_update_missing_category_is_not_found_before_validation() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let err = catalog
            .update_category(CategoryId::new(42), json!({"name": ""}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Category)));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog
            .create_category(json!({"name": "WiFi", "slug": "wifi"}))
            .await
            .unwrap();
        let err = catalog
            .update_category(created.id, json!({"name": "   "}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_NAME");
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog
            .create_category(json!({"name": "WiFi", "slug": "wifi", "description": "Radios"}))
            .await
            .unwrap();

        let updated = catalog
            .update_category(created.id, json!({"imageUrl": "/img/wifi.jpg"}))
            .await
            .unwrap();
        assert_eq!(updated.name, "WiFi");
        assert_eq!(updated.description.as_deref(), Some("Radios"));
        assert_eq!(updated.image_url.as_deref(), Some("/img/wifi.jpg"));
    }

    #[tokio::test]
    async fn test_get_by_blank_slug_is_not_found() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let err = catalog.get_category_by_slug(" ").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog
            .create_category(json!({"name": "WiFi", "slug": "wifi"}))
            .await
            .unwrap();

        let deleted = catalog.delete_category(created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        let err = catalog.delete_category(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Category)));
    }
}
