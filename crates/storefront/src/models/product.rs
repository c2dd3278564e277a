//! Product domain types.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use kandahar_core::{CategoryId, Price, ProductId, Slug};

use super::Page;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    /// Gallery image URLs in display order. `None` when unset or when the
    /// stored value could not be decoded.
    pub images: Option<Vec<String>>,
    pub stock: i32,
    pub featured: bool,
    pub age_range: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: i32,
    pub featured: bool,
    pub age_range: Option<String>,
}

/// Validated partial update for a product.
///
/// `None` leaves the column untouched; for nullable columns `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<Option<String>>,
    pub price: Option<Price>,
    pub category_id: Option<Option<CategoryId>>,
    pub image_url: Option<Option<String>>,
    pub images: Option<Option<Vec<String>>>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub age_range: Option<Option<String>>,
}

impl ProductPatch {
    /// Apply the patch to an in-memory product, leaving `updated_at` alone.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(slug) = &self.slug {
            product.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(image_url) = &self.image_url {
            product.image_url.clone_from(image_url);
        }
        if let Some(images) = &self.images {
            product.images.clone_from(images);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(age_range) = &self.age_range {
            product.age_range.clone_from(age_range);
        }
    }
}

/// Column a product listing can be sorted by.
///
/// Unknown `sort` values fall back to [`ProductSortKey::CreatedAt`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSortKey {
    #[default]
    CreatedAt,
    Price,
    Name,
    Stock,
}

impl ProductSortKey {
    /// Parse a `sort` query value against the allow-list.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price") => Self::Price,
            Some("name") => Self::Name,
            Some("stock") => Self::Stock,
            _ => Self::CreatedAt,
        }
    }

    /// The SQL column this key sorts on. Values come from the allow-list only.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Price => "price",
            Self::Name => "name",
            Self::Stock => "stock",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::Price => a.price.cmp(&b.price),
            Self::Name => a.name.cmp(&b.name),
            Self::Stock => a.stock.cmp(&b.stock),
        }
    }
}

/// Sort direction. Defaults to descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse an `order` query value; anything but `asc` is descending.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// SQL keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters, ordering, and window for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Substring matched against name or description.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Category given by slug; resolved by the store.
    pub category_slug: Option<Slug>,
    pub featured: Option<bool>,
    /// Product left out of the results (used for "related products").
    pub exclude_id: Option<ProductId>,
    pub sort: ProductSortKey,
    pub order: SortOrder,
    pub page: Page,
}

impl ProductFilter {
    /// Whether a product satisfies every predicate except `category_slug`,
    /// which needs the category table to resolve.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = self.search.as_deref()
            && !(product.name.contains(needle)
                || product
                    .description
                    .as_deref()
                    .is_some_and(|d| d.contains(needle)))
        {
            return false;
        }
        if self
            .category_id
            .is_some_and(|id| product.category_id != Some(id))
        {
            return false;
        }
        if self.featured.is_some_and(|f| product.featured != f) {
            return false;
        }
        if self.exclude_id.is_some_and(|id| product.id == id) {
            return false;
        }
        true
    }

    /// Total order used for listings: the sort key, then id, both in the
    /// requested direction.
    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = self.sort.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, name: &str, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            slug: Slug::parse(name).unwrap(),
            description: None,
            price: Price::from_i64(price).unwrap(),
            category_id: None,
            image_url: None,
            images: None,
            stock: 0,
            featured: false,
            age_range: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sort_key_allow_list() {
        assert_eq!(ProductSortKey::parse(Some("price")), ProductSortKey::Price);
        assert_eq!(ProductSortKey::parse(Some("name")), ProductSortKey::Name);
        assert_eq!(ProductSortKey::parse(Some("stock")), ProductSortKey::Stock);
        assert_eq!(
            ProductSortKey::parse(Some("id; DROP TABLE products")),
            ProductSortKey::CreatedAt
        );
        assert_eq!(ProductSortKey::parse(None), ProductSortKey::CreatedAt);
    }

    #[test]
    fn test_sort_order_defaults_to_desc() {
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
    }

    #[test]
    fn test_compare_breaks_ties_on_id() {
        let filter = ProductFilter {
            sort: ProductSortKey::Price,
            order: SortOrder::Asc,
            ..ProductFilter::default()
        };
        let mut items = vec![product(3, "c", 10), product(1, "a", 10), product(2, "b", 5)];
        items.sort_by(|a, b| filter.compare(a, b));
        let ids: Vec<i32> = items.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_matches_combines_with_and() {
        let mut item = product(1, "router-ax", 10);
        item.featured = true;
        item.category_id = Some(CategoryId::new(4));

        let filter = ProductFilter {
            search: Some("router".to_string()),
            category_id: Some(CategoryId::new(4)),
            featured: Some(true),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&item));

        let wrong_category = ProductFilter {
            category_id: Some(CategoryId::new(5)),
            ..filter.clone()
        };
        assert!(!wrong_category.matches(&item));

        let excluded = ProductFilter {
            exclude_id: Some(ProductId::new(1)),
            ..filter
        };
        assert!(!excluded.matches(&item));
    }

    #[test]
    fn test_patch_keeps_untouched_price() {
        let mut item = product(1, "r1", 50);
        let patch = ProductPatch {
            stock: Some(5),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut item);
        assert_eq!(item.stock, 5);
        assert_eq!(item.price, Price::from_i64(50).unwrap());
    }
}
