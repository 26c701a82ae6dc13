//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopipy_core::{Email, TagList};

/// One pending purchase intent: a stock unit of a product and a quantity.
///
/// Serialized as `{"stock_id", "item_id", "volume"}`, the shape stored in
/// the customer's cart column and returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Stock unit id; unique within a cart.
    pub stock_id: String,
    /// Product id the stock unit belongs to.
    pub item_id: String,
    /// Requested quantity.
    pub volume: u32,
}

/// A customer's cart.
///
/// Invariant: no two lines share a `stock_id`. Lines are never edited in
/// place; a changed quantity is a remove followed by an add.
///
/// Stored carts are read through [`Cart::from`], so duplicate stock ids
/// collapse to their first line on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart(Vec<CartLine>);

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if a line with this stock id is present.
    #[must_use]
    pub fn contains(&self, stock_id: &str) -> bool {
        self.0.iter().any(|line| line.stock_id == stock_id)
    }

    /// Append a line, unless its stock id is already present.
    ///
    /// Returns `false` (and leaves the cart untouched) for a duplicate.
    pub fn insert(&mut self, line: CartLine) -> bool {
        if self.contains(&line.stock_id) {
            return false;
        }
        self.0.push(line);
        true
    }

    /// A copy of this cart without any line for `stock_id`.
    #[must_use]
    pub fn without(&self, stock_id: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter(|line| line.stock_id != stock_id)
                .cloned()
                .collect(),
        )
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.0
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Build a cart from raw lines, keeping the first line per stock id.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.insert(line);
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.0
    }
}

/// A registered customer (domain type).
#[derive(Debug, Clone)]
pub struct Customer {
    /// Identity key.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Regions whose products this customer browses.
    pub region: TagList,
    pub is_active: bool,
    pub cart: Cart,
    /// Incremented on every cart write; used for compare-and-swap updates.
    pub cart_version: i64,
    pub date_joined: DateTime<Utc>,
}

/// Data required to create a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub region: TagList,
}
