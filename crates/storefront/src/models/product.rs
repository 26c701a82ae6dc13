//! Product domain types.
//!
//! A product owns a map of stock units (size/colour variants), each with a
//! server-assigned id, a declared `total`, and per-sub-item quantities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shopipy_core::ProductId;

/// Stock invariant violations detected when a product is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    /// A stock unit's declared total disagrees with its sub-item quantities.
    #[error("stock unit '{key}' declares total {declared} but its items sum to {actual}")]
    TotalMismatch {
        key: String,
        declared: u32,
        actual: u32,
    },

    /// Sub-item quantities overflow the counter.
    #[error("stock unit '{0}' item quantities overflow")]
    Overflow(String),
}

/// One quantity-tracked sub-item of a stock unit (for example one size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub qty: u32,
    /// Free-form attributes (size label, colour code, ...).
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A named, quantity-tracked variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUnit {
    /// Assigned on first save, never replaced afterwards.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    /// Units available; `None` means untracked.
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u32>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub items: BTreeMap<String, SubItem>,
}

impl StockUnit {
    /// Sum of the sub-item quantities.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Overflow` if the sum does not fit in `u32`.
    pub fn items_total(&self, key: &str) -> Result<u32, ProductError> {
        self.items.values().try_fold(0_u32, |acc, item| {
            acc.checked_add(item.qty)
                .ok_or_else(|| ProductError::Overflow(key.to_owned()))
        })
    }

    /// Whether `volume` units can be taken from this stock unit.
    ///
    /// Untracked units (no `total`) are always available.
    #[must_use]
    pub fn can_supply(&self, volume: u32) -> bool {
        self.total.is_none_or(|total| total >= volume)
    }
}

/// A catalog entry.
///
/// Field names are the JSON names clients consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Item type.
    pub brick: Option<String>,
    pub collection: Option<String>,
    /// Free-text gender tags, e.g. `"Men, Women"`.
    pub gender: String,
    pub mrp: Option<Decimal>,
    pub wsp: Option<Decimal>,
    pub style_code: Option<String>,
    pub style_2: Option<String>,
    /// Blob-store keys of the product images.
    pub image_1: Option<String>,
    pub image_2: Option<String>,
    pub image_3: Option<String>,
    pub image_4: Option<String>,
    pub created: DateTime<Utc>,
    pub uploaded_by: Option<String>,
    pub go_live_date: DateTime<Utc>,
    /// Free-text region tags, e.g. `"Western, South_Indian"`.
    pub style_region: Option<String>,
    #[serde(default)]
    pub stock_items: BTreeMap<String, StockUnit>,
    pub is_active: bool,
}

impl Product {
    /// Find the stock unit with the given id.
    #[must_use]
    pub fn stock_unit(&self, stock_id: &str) -> Option<&StockUnit> {
        self.stock_items
            .values()
            .find(|unit| unit.id.as_deref() == Some(stock_id))
    }

    /// Normalize stock units before the product is persisted.
    ///
    /// Units without an id get a fresh UUID (existing ids are kept). A
    /// missing `total` is filled from the sub-item quantities, a declared
    /// one must match them.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` if any stock unit violates the total invariant.
    pub fn prepare_for_save(&mut self) -> Result<(), ProductError> {
        for (key, unit) in &mut self.stock_items {
            if unit.id.is_none() {
                unit.id = Some(Uuid::new_v4().to_string());
            }

            let actual = unit.items_total(key)?;
            match unit.total {
                None => unit.total = Some(actual),
                Some(declared) if declared != actual => {
                    return Err(ProductError::TotalMismatch {
                        key: key.clone(),
                        declared,
                        actual,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Accept a count written as a number, a numeric string, or blank.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Count::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
