//! Order snapshot types.
//!
//! An order is written once, at placement, and records the resolved cart
//! as it was at that moment. Later catalog edits do not touch it; the only
//! field that changes afterwards is `delivered`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopipy_core::{Email, OrderId, ProductId, TagList};

use super::product::{Product, StockUnit, SubItem};

/// A resolved cart line, denormalized at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub brick: Option<String>,
    pub collection: Option<String>,
    pub gender: String,
    pub mrp: Option<Decimal>,
    pub wsp: Option<Decimal>,
    pub style_code: Option<String>,
    pub style_2: Option<String>,
    pub style_region: Option<String>,
    pub image_1: Option<String>,
    pub image_2: Option<String>,
    pub image_3: Option<String>,
    pub image_4: Option<String>,
    pub created: DateTime<Utc>,
    pub uploaded_by: Option<String>,
    pub go_live_date: DateTime<Utc>,
    pub is_active: bool,
    pub stock_id: String,
    pub stock_title: String,
    pub total_items: Option<u32>,
    pub discount: Option<Decimal>,
    pub items: BTreeMap<String, SubItem>,
    pub volume: u32,
}

impl OrderLine {
    /// Snapshot one cart line from its resolved product and stock unit.
    #[must_use]
    pub fn snapshot(product: &Product, stock_id: &str, unit: &StockUnit, volume: u32) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            brick: product.brick.clone(),
            collection: product.collection.clone(),
            gender: product.gender.clone(),
            mrp: product.mrp,
            wsp: product.wsp,
            style_code: product.style_code.clone(),
            style_2: product.style_2.clone(),
            style_region: product.style_region.clone(),
            image_1: product.image_1.clone(),
            image_2: product.image_2.clone(),
            image_3: product.image_3.clone(),
            image_4: product.image_4.clone(),
            created: product.created,
            uploaded_by: product.uploaded_by.clone(),
            go_live_date: product.go_live_date,
            is_active: product.is_active,
            stock_id: stock_id.to_owned(),
            stock_title: unit.title.clone(),
            total_items: unit.total,
            discount: unit.discount,
            items: unit.items.clone(),
            volume,
        }
    }
}

/// An immutable order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Email of the customer who placed the order.
    pub name: Email,
    /// The customer's regions at placement time.
    pub region: TagList,
    pub date: DateTime<Utc>,
    pub delivered: bool,
    pub total_mrp: Option<Decimal>,
    pub total_wsp: Option<Decimal>,
    pub items: Vec<OrderLine>,
}

impl Order {
    /// Build a new, undelivered order from snapshotted lines.
    ///
    /// Totals sum `price * volume` over the lines that carry that price and
    /// are `None` when no line does.
    #[must_use]
    pub fn new(name: Email, region: TagList, date: DateTime<Utc>, items: Vec<OrderLine>) -> Self {
        let total_mrp = sum_prices(&items, |line| line.mrp);
        let total_wsp = sum_prices(&items, |line| line.wsp);

        Self {
            id: OrderId::new(),
            name,
            region,
            date,
            delivered: false,
            total_mrp,
            total_wsp,
            items,
        }
    }
}

fn sum_prices(items: &[OrderLine], price: impl Fn(&OrderLine) -> Option<Decimal>) -> Option<Decimal> {
    items
        .iter()
        .filter_map(|line| price(line).map(|p| p * Decimal::from(line.volume)))
        .reduce(|acc, amount| acc + amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(mrp: Option<i64>, wsp: Option<i64>, volume: u32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(),
            title: "Shirt".to_string(),
            brand: None,
            category: None,
            brick: None,
            collection: None,
            gender: "Men".to_string(),
            mrp: mrp.map(Decimal::from),
            wsp: wsp.map(Decimal::from),
            style_code: None,
            style_2: None,
            style_region: None,
            image_1: None,
            image_2: None,
            image_3: None,
            image_4: None,
            created: Utc::now(),
            uploaded_by: None,
            go_live_date: Utc::now(),
            is_active: true,
            stock_id: "s1".to_string(),
            stock_title: "Blue".to_string(),
            total_items: Some(10),
            discount: None,
            items: BTreeMap::new(),
            volume,
        }
    }

    fn email() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    #[test]
    fn test_snapshot_copies_product_fields() {
        let mut product = crate::services::catalog::tests::product("Kurta", Some(900), 4);
        product.style_2 = Some("K-2".to_string());
        product.image_3 = Some("blob/k3.jpg".to_string());
        product.uploaded_by = Some("ops".to_string());
        product.is_active = false;
        let unit = product.stock_unit("s-Kurta").unwrap().clone();

        let line = OrderLine::snapshot(&product, "s-Kurta", &unit, 2);

        assert_eq!(line.product_id, product.id);
        assert_eq!(line.style_2.as_deref(), Some("K-2"));
        assert_eq!(line.image_3.as_deref(), Some("blob/k3.jpg"));
        assert_eq!(line.uploaded_by.as_deref(), Some("ops"));
        assert_eq!(line.created, product.created);
        assert_eq!(line.go_live_date, product.go_live_date);
        assert!(!line.is_active);
        assert_eq!(line.stock_title, "Kurta / M");
        assert_eq!(line.volume, 2);
    }

    #[test]
    fn test_new_order_is_undelivered() {
        let order = Order::new(email(), TagList::default(), Utc::now(), vec![]);
        assert!(!order.delivered);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_totals_multiply_by_volume() {
        let order = Order::new(
            email(),
            TagList::default(),
            Utc::now(),
            vec![line(Some(100), Some(60), 2), line(Some(50), None, 1)],
        );

        assert_eq!(order.total_mrp, Some(Decimal::from(250)));
        assert_eq!(order.total_wsp, Some(Decimal::from(120)));
    }

    #[test]
    fn test_totals_absent_without_prices() {
        let order = Order::new(email(), TagList::default(), Utc::now(), vec![line(None, None, 3)]);
        assert_eq!(order.total_mrp, None);
        assert_eq!(order.total_wsp, None);
    }
}
