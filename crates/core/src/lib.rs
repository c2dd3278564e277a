//! Kandahar Core - Shared domain types.
//!
//! This crate provides the value types used across the Kandahar components:
//! - `storefront` - Catalog and cart JSON API
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Enable the `postgres` feature to get `sqlx` encode/decode
//! implementations for the id newtypes and slugs.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, slugs, cart sessions and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
