//! Persistence for customers, products, and orders.
//!
//! # Database: `shopipy`
//!
//! ## Tables
//!
//! - `customer` - Accounts, password hashes, and the versioned cart (JSONB)
//! - `product` - Catalog entries with their stock units (JSONB)
//! - `customer_order` - Immutable order snapshots (JSONB line items)
//!
//! # Schema
//!
//! The schema lives in `crates/storefront/migrations/`. It is applied by the
//! operator (for example with `sqlx migrate run`); the service never
//! migrates on start-up.
//!
//! # Implementations
//!
//! - [`PgStore`] - `PostgreSQL` via `sqlx`
//! - [`MemoryStore`] - process-local maps, used by tests

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopipy_core::{Email, OrderId, ProductId};

use crate::models::{Cart, Customer, NewCustomer, Order, Product};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or lost compare-and-swap race.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// The persistent store behind every handler.
///
/// Cart writes are compare-and-swap on [`Customer::cart_version`]: a write
/// carrying a stale version fails with [`RepositoryError::Conflict`]
/// instead of overwriting a concurrent update.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Create a customer with an empty cart.
    ///
    /// Fails with `Conflict` if the email is already registered.
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    /// Get a customer by email.
    async fn customer(&self, email: &Email) -> Result<Option<Customer>, RepositoryError>;

    /// Get a customer together with their password hash.
    async fn customer_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError>;

    /// Replace a customer's cart if its version is still `expected_version`.
    ///
    /// Returns the new version. Fails with `NotFound` if the customer is
    /// gone and `Conflict` if the cart changed since it was read.
    async fn save_cart(
        &self,
        email: &Email,
        expected_version: i64,
        cart: &Cart,
    ) -> Result<i64, RepositoryError>;

    /// Get a product by id.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// All products, newest first.
    async fn products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert or replace a product.
    ///
    /// Callers normalize stock units first (see `Product::prepare_for_save`).
    async fn upsert_product(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Insert an order and empty the owner's cart in one atomic step.
    ///
    /// The cart must still be at `expected_cart_version`, otherwise nothing
    /// is written and `Conflict` is returned. An unknown owner is
    /// `NotFound`.
    async fn commit_order(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<(), RepositoryError>;

    /// Orders placed by a customer, newest first.
    async fn orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError>;

    /// Set an order's delivery flag.
    async fn set_delivered(&self, id: OrderId, delivered: bool) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
