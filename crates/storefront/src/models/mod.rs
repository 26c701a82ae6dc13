//! Domain models for the storefront.
//!
//! Each entity has one statically declared serialized shape; responses are
//! built from these types rather than by walking fields at runtime.
//!
//! - [`customer`] - Customers and their carts
//! - [`product`] - Catalog entries and their stock units
//! - [`order`] - Immutable order snapshots

pub mod customer;
pub mod order;
pub mod product;

pub use customer::{Cart, CartLine, Customer, NewCustomer};
pub use order::{Order, OrderLine};
pub use product::{Product, ProductError, StockUnit, SubItem};
