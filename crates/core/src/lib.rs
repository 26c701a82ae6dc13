//! Shopipy Core - Shared domain types.
//!
//! This crate provides the value types used by the storefront service:
//! validated email addresses, UUID-backed entity identifiers, and the
//! comma-separated tag lists that products and customers carry.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds `sqlx` encoding
//! so the types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and tag lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
