//! Process-local store.
//!
//! All tables live behind a single [`RwLock`], so every write (including the
//! slug uniqueness check and cart accumulation) happens under one exclusive
//! guard. Data is lost when the process exits.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use kandahar_core::{CartItemId, CategoryId, ProductId, SessionId, Slug};

use super::{CartRepo, CategoryRepo, ProductRepo, RepositoryError, Store, images};
use crate::models::{
    CartAdd, CartItem, CartUpsert, Category, CategoryFilter, CategoryPatch, NewCategory,
    NewProduct, Product, ProductFilter, ProductPatch,
};

const CATEGORIES_SLUG_KEY: &str = "categories_slug_key";
const PRODUCTS_SLUG_KEY: &str = "products_slug_key";
const PRODUCTS_CATEGORY_FKEY: &str = "products_category_id_fkey";
const CART_ITEMS_PRODUCT_FKEY: &str = "cart_items_product_id_fkey";

/// A product as stored: gallery images are kept in their column encoding.
#[derive(Debug, Clone)]
struct ProductRecord {
    product: Product,
    images: Option<String>,
}

impl ProductRecord {
    fn to_product(&self) -> Product {
        let mut product = self.product.clone();
        product.images = images::decode(self.images.as_deref(), product.id);
        product
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductRecord>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    next_category_id: i32,
    next_product_id: i32,
    next_cart_item_id: i32,
}

impl Tables {
    fn category_slug_taken(&self, slug: &Slug, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| &c.slug == slug && Some(c.id) != except)
    }

    fn product_slug_taken(&self, slug: &Slug, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|r| &r.product.slug == slug && Some(r.product.id) != except)
    }

    fn check_category_ref(&self, category_id: Option<CategoryId>) -> Result<(), RepositoryError> {
        match category_id {
            Some(id) if !self.categories.contains_key(&id) => Err(
                RepositoryError::InvalidReference(PRODUCTS_CATEGORY_FKEY.to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Store keeping every table in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored `images` column of a product with raw text.
    ///
    /// Lets tests reproduce rows written by other tools.
    #[doc(hidden)]
    pub async fn set_raw_images(&self, id: ProductId, raw: Option<String>) -> bool {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&id) {
            Some(record) => {
                record.images = raw;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| &c.slug == slug)
            .cloned())
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Category> = tables
            .categories
            .values()
            .filter(|c| filter.matches(c))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(filter.page.apply(rows.into_iter().cloned()))
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.category_slug_taken(&new.slug, None) {
            return Err(RepositoryError::Conflict(CATEGORIES_SLUG_KEY.to_string()));
        }

        tables.next_category_id += 1;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(tables.next_category_id),
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            image_url: new.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &patch.slug
            && tables.category_slug_taken(slug, Some(id))
        {
            return Err(RepositoryError::Conflict(CATEGORIES_SLUG_KEY.to_string()));
        }

        let Some(category) = tables.categories.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(category);
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(category) = tables.categories.remove(&id) else {
            return Ok(None);
        };
        for record in tables.products.values_mut() {
            if record.product.category_id == Some(id) {
                record.product.category_id = None;
            }
        }
        Ok(Some(category))
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).map(ProductRecord::to_product))
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .find(|r| &r.product.slug == slug)
            .map(ProductRecord::to_product))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;

        let slug_category = match &filter.category_slug {
            Some(slug) => match tables.categories.values().find(|c| &c.slug == slug) {
                Some(category) => Some(category.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut rows: Vec<Product> = tables
            .products
            .values()
            .filter(|r| filter.matches(&r.product))
            .filter(|r| slug_category.is_none_or(|id| r.product.category_id == Some(id)))
            .map(ProductRecord::to_product)
            .collect();
        rows.sort_by(|a, b| filter.compare(a, b));
        Ok(filter.page.apply(rows))
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let encoded = images::encode(new.images.as_deref())?;
        let mut tables = self.tables.write().await;
        if tables.product_slug_taken(&new.slug, None) {
            return Err(RepositoryError::Conflict(PRODUCTS_SLUG_KEY.to_string()));
        }
        tables.check_category_ref(new.category_id)?;

        tables.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(tables.next_product_id),
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            price: new.price,
            category_id: new.category_id,
            image_url: new.image_url.clone(),
            images: None,
            stock: new.stock,
            featured: new.featured,
            age_range: new.age_range.clone(),
            created_at: now,
            updated_at: now,
        };
        let record = ProductRecord {
            product,
            images: encoded,
        };
        let product = record.to_product();
        tables.products.insert(product.id, record);
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let encoded = patch
            .images
            .as_ref()
            .map(|images| images::encode(images.as_deref()))
            .transpose()?;

        let mut tables = self.tables.write().await;
        if let Some(slug) = &patch.slug
            && tables.product_slug_taken(slug, Some(id))
        {
            return Err(RepositoryError::Conflict(PRODUCTS_SLUG_KEY.to_string()));
        }
        if let Some(category_id) = patch.category_id {
            tables.check_category_ref(category_id)?;
        }

        let Some(record) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(&mut record.product);
        if let Some(encoded) = encoded {
            record.images = encoded;
        }
        record.product.updated_at = Utc::now();
        Ok(Some(record.to_product()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.products.remove(&id) else {
            return Ok(None);
        };
        tables.cart_items.retain(|_, item| item.product_id != id);
        Ok(Some(record.to_product()))
    }
}

#[async_trait]
impl CartRepo for MemoryStore {
    async fn add_cart_item(&self, add: &CartAdd) -> Result<CartUpsert, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&add.product_id) {
            return Err(RepositoryError::InvalidReference(
                CART_ITEMS_PRODUCT_FKEY.to_string(),
            ));
        }

        let existing = tables
            .cart_items
            .values_mut()
            .find(|item| item.session_id == add.session_id && item.product_id == add.product_id);

        if let Some(item) = existing {
            item.quantity = item.quantity.checked_add(add.quantity).ok_or_else(|| {
                RepositoryError::OutOfRange("cart quantity overflows integer".to_string())
            })?;
            return Ok(CartUpsert {
                item: item.clone(),
                created: false,
            });
        }

        tables.next_cart_item_id += 1;
        let item = CartItem {
            id: CartItemId::new(tables.next_cart_item_id),
            session_id: add.session_id.clone(),
            product_id: add.product_id,
            quantity: add.quantity,
            created_at: Utc::now(),
        };
        tables.cart_items.insert(item.id, item.clone());
        Ok(CartUpsert {
            item,
            created: true,
        })
    }

    async fn list_cart_items(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CartItem> = tables
            .cart_items
            .values()
            .filter(|item| &item.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kandahar_core::Price;

    use super::*;
    use crate::models::Page;

    fn new_category(slug: &str) -> NewCategory {
        NewCategory {
            name: slug.to_uppercase(),
            slug: Slug::parse(slug).unwrap(),
            description: None,
            image_url: None,
        }
    }

    fn new_product(slug: &str, price: i64, category_id: Option<CategoryId>) -> NewProduct {
        NewProduct {
            name: slug.to_string(),
            slug: Slug::parse(slug).unwrap(),
            description: None,
            price: Price::from_i64(price).unwrap(),
            category_id,
            image_url: None,
            images: None,
            stock: 0,
            featured: false,
            age_range: None,
        }
    }

    fn add(session: &str, product_id: ProductId, quantity: i32) -> CartAdd {
        CartAdd {
            session_id: SessionId::parse(session).unwrap(),
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_duplicate_category_slug_conflicts() {
        let store = MemoryStore::new();
        store.create_category(&new_category("routers")).await.unwrap();
        let err = store
            .create_category(&new_category("routers"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_to_own_slug_is_not_a_conflict() {
        let store = MemoryStore::new();
        let created = store.create_category(&new_category("routers")).await.unwrap();
        let patch = CategoryPatch {
            slug: Some(created.slug.clone()),
            ..CategoryPatch::default()
        };
        let updated = store
            .update_category(created.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.slug, created.slug);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_category_detaches_products() {
        let store = MemoryStore::new();
        let category = store.create_category(&new_category("switches")).await.unwrap();
        let product = store
            .create_product(&new_product("sw-8", 40, Some(category.id)))
            .await
            .unwrap();

        store.delete_category(category.id).await.unwrap().unwrap();

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.category_id, None);
    }

    #[tokio::test]
    async fn test_product_with_missing_category_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_product(&new_product("ghost", 1, Some(CategoryId::new(99))))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_list_products_by_category_slug() {
        let store = MemoryStore::new();
        let routers = store.create_category(&new_category("routers")).await.unwrap();
        store
            .create_product(&new_product("r1", 10, Some(routers.id)))
            .await
            .unwrap();
        store.create_product(&new_product("other", 10, None)).await.unwrap();

        let filter = ProductFilter {
            category_slug: Some(routers.slug.clone()),
            ..ProductFilter::default()
        };
        let rows = store.list_products(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slug.as_str(), "r1");

        let unknown = ProductFilter {
            category_slug: Some(Slug::parse("nope").unwrap()),
            ..ProductFilter::default()
        };
        assert!(store.list_products(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_products_pages_are_disjoint() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_product(&new_product(&format!("p{i}"), i, None))
                .await
                .unwrap();
        }
        let page = |offset| ProductFilter {
            page: Page::new(2, offset),
            ..ProductFilter::default()
        };
        let first = store.list_products(&page(0)).await.unwrap();
        let second = store.list_products(&page(2)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
    }

    #[tokio::test]
    async fn test_cart_accumulates_quantity() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("r1", 50, None)).await.unwrap();

        let first = store.add_cart_item(&add("s1", product.id, 2)).await.unwrap();
        assert!(first.created);
        let second = store.add_cart_item(&add("s1", product.id, 3)).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.item.id, first.item.id);
        assert_eq!(second.item.quantity, 5);

        let other = store.add_cart_item(&add("s2", product.id, 1)).await.unwrap();
        assert!(other.created);
        let lines = store
            .list_cart_items(&SessionId::parse("s1").unwrap())
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_share_one_line() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("r1", 50, None)).await.unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_cart_item(&add("s1", product.id, 1)).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().created {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let lines = store
            .list_cart_items(&SessionId::parse("s1").unwrap())
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 32);
    }

    #[tokio::test]
    async fn test_cart_quantity_overflow() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("r1", 50, None)).await.unwrap();
        store
            .add_cart_item(&add("s1", product.id, i32::MAX))
            .await
            .unwrap();
        let err = store
            .add_cart_item(&add("s1", product.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::OutOfRange(_)));
    }

    #[tokio::test]
    async fn test_delete_product_removes_cart_lines() {
        let store = MemoryStore::new();
        let product = store.create_product(&new_product("r1", 50, None)).await.unwrap();
        store.add_cart_item(&add("s1", product.id, 1)).await.unwrap();

        store.delete_product(product.id).await.unwrap().unwrap();

        let lines = store
            .list_cart_items(&SessionId::parse("s1").unwrap())
            .await
            .unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_images_read_as_none() {
        let store = MemoryStore::new();
        let mut new = new_product("r1", 50, None);
        new.images = Some(vec!["/a.jpg".to_string()]);
        let product = store.create_product(&new).await.unwrap();
        assert_eq!(product.images.as_deref(), Some(&["/a.jpg".to_string()][..]));

        assert!(
            store
                .set_raw_images(product.id, Some("not json".to_string()))
                .await
        );
        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.images, None);
    }
}
