//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod session;
pub mod slug;

pub use id::*;
pub use price::{Price, PriceError};
pub use session::{SessionId, SessionIdError};
pub use slug::{Slug, SlugError};
