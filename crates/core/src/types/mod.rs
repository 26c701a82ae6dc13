//! Core types for Shopipy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod tags;

pub use email::{Email, EmailError};
pub use id::*;
pub use tags::TagList;
