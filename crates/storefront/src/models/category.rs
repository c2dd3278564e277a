//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kandahar_core::{CategoryId, Slug};

use super::Page;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Validated partial update for a category.
///
/// `None` leaves the column untouched. For nullable columns the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl CategoryPatch {
    /// Apply the patch to an in-memory category, leaving `updated_at` alone.
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name.clone_from(name);
        }
        if let Some(slug) = &self.slug {
            category.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            category.description.clone_from(description);
        }
        if let Some(image_url) = &self.image_url {
            category.image_url.clone_from(image_url);
        }
    }
}

/// Filters for listing categories. Results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Substring matched against name, slug, or description.
    pub search: Option<String>,
    pub page: Page,
}

impl CategoryFilter {
    /// Whether a category satisfies the search predicate.
    #[must_use]
    pub fn matches(&self, category: &Category) -> bool {
        let Some(needle) = self.search.as_deref() else {
            return true;
        };
        category.name.contains(needle)
            || category.slug.as_str().contains(needle)
            || category
                .description
                .as_deref()
                .is_some_and(|d| d.contains(needle))
    }
}
