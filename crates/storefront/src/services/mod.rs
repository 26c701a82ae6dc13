//! Business logic services for storefront.
//!
//! # Services
//!
//! - `token` - Access/refresh token issuance and validation
//! - `auth` - Customer signup and password login
//! - `cart` - Cart ledger (add, remove, fetch, resolve)
//! - `catalog` - Product lookup, regional listing, filtering, pagination
//! - `orders` - Order placement from the cart
//!
//! Services other than `token` borrow the `Store` for the duration of one
//! request; they hold no state of their own.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod token;

pub use auth::{AuthError, AuthService, Signup};
pub use cart::{AddOutcome, CartError, CartLedger};
pub use catalog::{Catalog, CatalogError, Page, ResolvedLine, SortBy};
pub use orders::{OrderError, OrderService, Placement};
pub use token::{Claims, TokenError, TokenKind, TokenPair, TokenService};
