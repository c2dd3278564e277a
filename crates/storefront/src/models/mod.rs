//! Domain models for the storefront.
//!
//! These types represent validated domain objects, separate from the
//! database row types in [`crate::db`]. Input types (`New*`, `*Patch`) only
//! ever hold values that already passed request validation.

pub mod cart;
pub mod category;
pub mod pagination;
pub mod product;

pub use cart::{CartAdd, CartItem, CartUpsert};
pub use category::{Category, CategoryFilter, CategoryPatch, NewCategory};
pub use pagination::Page;
pub use product::{NewProduct, Product, ProductFilter, ProductPatch, ProductSortKey, SortOrder};
