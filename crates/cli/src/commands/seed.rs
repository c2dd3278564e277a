//! Seed the catalog with categories and products from a YAML file.
//!
//! Every entry goes through the storefront's catalog service, so the seed
//! file is held to the same validation as the JSON API. Entries whose slug
//! already exists are skipped, which makes re-running the seeder safe.
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Modems
//!     slug: modems
//!     description: Cable and DSL modems
//! products:
//!   - name: DOCSIS 3.1 Cable Modem
//!     slug: docsis-31-cable-modem
//!     price: 189.99
//!     category: modems
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use kandahar_storefront::db::{self, MemoryStore, PgStore, Store};
use kandahar_storefront::services::{CatalogService, ServiceError};

use super::migrate::{self, MigrationError};

/// Errors raised while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to encode seed entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Environment(#[from] MigrationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{slug}: {source}")]
    Entry {
        slug: String,
        #[source]
        source: ServiceError,
    },

    #[error("{product}: unknown category '{category}'")]
    UnknownCategory { product: String, category: String },
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A category entry. Serializes to the JSON API's create body.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all(serialize = "camelCase"))]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A product entry. `category` names the category by slug.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all(serialize = "camelCase"))]
pub struct ProductSeed {
    pub name: String,
    pub slug: String,
    pub price: Value,
    #[serde(default, skip_serializing)]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
}

/// Inserted and skipped counts for one table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub inserted: usize,
    pub skipped: usize,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: Tally,
    pub products: Tally,
}

/// Parse a seed file.
///
/// # Errors
///
/// Returns `SeedError::Yaml` if the document does not match the format.
pub fn parse(content: &str) -> Result<CatalogSeed, SeedError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Insert every entry of `seed` into `store`, categories first.
///
/// # Errors
///
/// Stops at the first entry that fails validation or names an unknown
/// category. Entries inserted before the failure are kept.
pub async fn apply(store: &dyn Store, seed: &CatalogSeed) -> Result<SeedReport, SeedError> {
    let catalog = CatalogService::new(store);
    let mut report = SeedReport::default();

    for category in &seed.categories {
        match catalog
            .create_category(serde_json::to_value(category)?)
            .await
        {
            Ok(_) => {
                info!(slug = %category.slug, "Inserted category");
                report.categories.inserted += 1;
            }
            Err(ServiceError::Conflict(_)) => {
                info!(slug = %category.slug, "Category already exists, skipping");
                report.categories.skipped += 1;
            }
            Err(source) => {
                return Err(SeedError::Entry {
                    slug: category.slug.clone(),
                    source,
                });
            }
        }
    }

    for product in &seed.products {
        let mut body = serde_json::to_value(product)?;

        if let Some(category_slug) = &product.category {
            let category = match catalog.get_category_by_slug(category_slug).await {
                Ok(category) => category,
                Err(ServiceError::NotFound(_)) => {
                    return Err(SeedError::UnknownCategory {
                        product: product.slug.clone(),
                        category: category_slug.clone(),
                    });
                }
                Err(source) => {
                    return Err(SeedError::Entry {
                        slug: product.slug.clone(),
                        source,
                    });
                }
            };
            if let Value::Object(fields) = &mut body {
                fields.insert("categoryId".to_owned(), serde_json::to_value(category.id)?);
            }
        }

        match catalog.create_product(body).await {
            Ok(_) => {
                info!(slug = %product.slug, "Inserted product");
                report.products.inserted += 1;
            }
            Err(ServiceError::Conflict(_)) => {
                info!(slug = %product.slug, "Product already exists, skipping");
                report.products.skipped += 1;
            }
            Err(source) => {
                return Err(SeedError::Entry {
                    slug: product.slug.clone(),
                    source,
                });
            }
        }
    }

    Ok(report)
}

/// Seed the catalog from a YAML file.
///
/// With `dry_run` the entries are validated against an empty in-memory store
/// and the database is never contacted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database URL is
/// missing, the connection fails, or an entry is invalid.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog seed");

    // Parse before connecting so a broken file never touches the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed = parse(&content)?;

    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let report = if dry_run {
        info!("Dry run: validating against an in-memory store");
        apply(&MemoryStore::new(), &seed).await?
    } else {
        let database_url = migrate::database_url()?;
        let pool = db::create_pool(&database_url, 2).await?;
        info!("Connected to database");
        apply(&PgStore::new(pool), &seed).await?
    };

    info!("Seeding complete!");
    info!("  Categories inserted: {}", report.categories.inserted);
    info!(
        "  Categories skipped (already exist): {}",
        report.categories.skipped
    );
    info!("  Products inserted: {}", report.products.inserted);
    info!(
        "  Products skipped (already exist): {}",
        report.products.skipped
    );

    Ok(())
}
