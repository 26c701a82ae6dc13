//! Order placement.
//!
//! Placement runs resolve, check, commit, and clear. A failure before the
//! commit leaves the cart as it was. The commit writes the order and empties
//! the cart in one store operation guarded by the cart version read at the
//! start, so a cart edited mid-placement aborts with `Conflict`.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use shopipy_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{Order, OrderLine};
use crate::services::catalog::{Catalog, CatalogError};

/// Errors that abort an order placement.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The authenticated customer no longer exists.
    #[error("customer not found")]
    CustomerNotFound,

    /// The cart changed while the order was being placed.
    #[error("cart was modified concurrently")]
    Conflict,

    /// A cart line no longer resolves against the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::CustomerNotFound,
            RepositoryError::Conflict(_) => Self::Conflict,
            other => Self::Repository(other),
        }
    }
}

/// Result of a placement that did not fail outright.
#[derive(Debug, Clone)]
pub enum Placement {
    /// The order was written and the cart emptied.
    Placed(Order),
    /// A line asks for more than its stock unit holds. Nothing was written.
    OutOfStock {
        /// Title of the exhausted stock unit.
        title: String,
    },
}

/// Order placement service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the customer's cart into an order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart`, `CustomerNotFound`, `Catalog` when a line does not
    /// resolve, or `Conflict` when the cart changed concurrently.
    #[instrument(skip(self))]
    pub async fn place(&self, email: &Email) -> Result<Placement, OrderError> {
        let customer = self
            .store
            .customer(email)
            .await?
            .ok_or(OrderError::CustomerNotFound)?;
        if customer.cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let resolved = Catalog::new(self.store)
            .resolve_lines(customer.cart.lines())
            .await?;

        if let Some(short) = resolved.iter().find(|line| !line.unit.can_supply(line.volume)) {
            tracing::info!(
                stock_id = %short.stock_id,
                requested = short.volume,
                available = ?short.unit.total,
                "Order rejected: out of stock"
            );
            return Ok(Placement::OutOfStock {
                title: short.unit.title.clone(),
            });
        }

        let items = resolved
            .iter()
            .map(|line| OrderLine::snapshot(&line.product, &line.stock_id, &line.unit, line.volume))
            .collect();
        let order = Order::new(customer.email, customer.region, Utc::now(), items);

        self.store
            .commit_order(&order, customer.cart_version)
            .await?;

        tracing::info!(order_id = %order.id, lines = order.items.len(), "Order placed");
        Ok(Placement::Placed(order))
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error on store failure.
    #[instrument(skip(self))]
    pub async fn history(&self, email: &Email) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.orders_for(email).await?)
    }
}
