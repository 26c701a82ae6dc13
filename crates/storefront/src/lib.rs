//! Shopipy storefront library.
//!
//! Customer accounts, bearer-token auth, carts, the product catalog, and
//! order placement, served as HTTP JSON. The binary in `main.rs` wires this
//! library to `PostgreSQL`; tests wire it to the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
