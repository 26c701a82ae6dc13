//! Cart ledger: the customer's list of `(stock_id, item_id, volume)` lines.
//!
//! Adding a stock id that is already in the cart succeeds without touching
//! it. Every write is a compare-and-swap on the customer's cart version, so
//! concurrent edits surface as [`CartError::Conflict`] instead of one
//! silently overwriting the other.

use thiserror::Error;
use tracing::instrument;

use shopipy_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{Cart, CartLine, Customer};
use crate::services::catalog::{Catalog, CatalogError, ResolvedLine};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A required field is missing, empty, or zero.
    #[error("invalid cart input: {0}")]
    InvalidInput(&'static str),

    /// The authenticated customer no longer exists.
    #[error("customer not found")]
    CustomerNotFound,

    /// The cart changed between read and write.
    #[error("cart was modified concurrently")]
    Conflict,

    /// A cart line no longer resolves against the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::CustomerNotFound,
            RepositoryError::Conflict(_) => Self::Conflict,
            other => Self::Repository(other),
        }
    }
}

/// Result of [`CartLedger::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The line was appended.
    Added(CartLine),
    /// A line with this stock id was already present; nothing changed.
    AlreadyPresent,
}

/// Cart operations for one store.
pub struct CartLedger<'a> {
    store: &'a dyn Store,
}

impl<'a> CartLedger<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn customer(&self, email: &Email) -> Result<Customer, CartError> {
        self.store
            .customer(email)
            .await?
            .ok_or(CartError::CustomerNotFound)
    }

    /// Append a line unless its stock id is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty id or zero volume,
    /// `CustomerNotFound`, or `Conflict` if the cart changed concurrently.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        email: &Email,
        stock_id: &str,
        item_id: &str,
        volume: u32,
    ) -> Result<AddOutcome, CartError> {
        if stock_id.is_empty() {
            return Err(CartError::InvalidInput("stock_id"));
        }
        if item_id.is_empty() {
            return Err(CartError::InvalidInput("post_id"));
        }
        if volume == 0 {
            return Err(CartError::InvalidInput("volume"));
        }

        let customer = self.customer(email).await?;
        let mut cart = customer.cart;
        let line = CartLine {
            stock_id: stock_id.to_owned(),
            item_id: item_id.to_owned(),
            volume,
        };
        if !cart.insert(line.clone()) {
            tracing::debug!(stock_id, "Stock unit already in cart");
            return Ok(AddOutcome::AlreadyPresent);
        }

        self.store
            .save_cart(email, customer.cart_version, &cart)
            .await?;
        Ok(AddOutcome::Added(line))
    }

    /// Drop every line for `stock_id` and return the resulting cart.
    ///
    /// Removing an absent stock id returns the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty id, `CustomerNotFound`, or
    /// `Conflict` if the cart changed concurrently.
    #[instrument(skip(self))]
    pub async fn remove(&self, email: &Email, stock_id: &str) -> Result<Cart, CartError> {
        if stock_id.is_empty() {
            return Err(CartError::InvalidInput("stock_id"));
        }

        let customer = self.customer(email).await?;
        if !customer.cart.contains(stock_id) {
            return Ok(customer.cart);
        }

        let cart = customer.cart.without(stock_id);
        self.store
            .save_cart(email, customer.cart_version, &cart)
            .await?;
        Ok(cart)
    }

    /// The customer's cart as stored.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` or a repository error.
    #[instrument(skip(self))]
    pub async fn fetch(&self, email: &Email) -> Result<Cart, CartError> {
        Ok(self.customer(email).await?.cart)
    }

    /// The customer's cart with each line resolved to its product and stock
    /// unit. Any unresolvable line fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound`, or `Catalog` if a product or stock unit
    /// is gone.
    #[instrument(skip(self))]
    pub async fn fetch_resolved(&self, email: &Email) -> Result<Vec<ResolvedLine>, CartError> {
        let cart = self.fetch(email).await?;
        Ok(Catalog::new(self.store).resolve_lines(cart.lines()).await?)
    }
}
