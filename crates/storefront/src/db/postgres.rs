//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`sqlx::query_as`) and map rows into the
//! domain types in [`crate::models`]. JSON columns go through
//! [`sqlx::types::Json`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use shopipy_core::{Email, OrderId, ProductId, TagList};

use super::{RepositoryError, Store};
use crate::models::{Cart, Customer, NewCustomer, Order, OrderLine, Product, StockUnit};

const CUSTOMER_COLUMNS: &str = "email, first_name, last_name, region, is_active, cart, \
                                cart_version, date_joined";

const PRODUCT_COLUMNS: &str = "id, title, brand, category, brick, collection, gender, mrp, wsp, \
                               style_code, style_2, image_1, image_2, image_3, image_4, created, \
                               uploaded_by, go_live_date, style_region, stock_items, is_active";

const ORDER_COLUMNS: &str = "id, name, region, date, delivered, total_mrp, total_wsp, items";

/// `PostgreSQL` implementation of [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A versioned cart write matched no row: distinguish a missing
    /// customer (`NotFound`) from a lost race (`Conflict`).
    async fn stale_cart_error(&self, email: &Email) -> Result<RepositoryError, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(if exists {
            RepositoryError::Conflict("cart was modified".to_owned())
        } else {
            RepositoryError::NotFound
        })
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    email: Email,
    first_name: String,
    last_name: String,
    region: Option<String>,
    is_active: bool,
    cart: Json<Cart>,
    cart_version: i64,
    date_joined: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Self {
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            region: TagList::parse_optional(r.region.as_deref()),
            is_active: r.is_active,
            cart: r.cart.0,
            cart_version: r.cart_version,
            date_joined: r.date_joined,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerPasswordRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    brand: Option<String>,
    category: Option<String>,
    brick: Option<String>,
    collection: Option<String>,
    gender: String,
    mrp: Option<Decimal>,
    wsp: Option<Decimal>,
    style_code: Option<String>,
    style_2: Option<String>,
    image_1: Option<String>,
    image_2: Option<String>,
    image_3: Option<String>,
    image_4: Option<String>,
    created: DateTime<Utc>,
    uploaded_by: Option<String>,
    go_live_date: DateTime<Utc>,
    style_region: Option<String>,
    stock_items: Json<BTreeMap<String, StockUnit>>,
    is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            brand: r.brand,
            category: r.category,
            brick: r.brick,
            collection: r.collection,
            gender: r.gender,
            mrp: r.mrp,
            wsp: r.wsp,
            style_code: r.style_code,
            style_2: r.style_2,
            image_1: r.image_1,
            image_2: r.image_2,
            image_3: r.image_3,
            image_4: r.image_4,
            created: r.created,
            uploaded_by: r.uploaded_by,
            go_live_date: r.go_live_date,
            style_region: r.style_region,
            stock_items: r.stock_items.0,
            is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    name: Email,
    region: Option<String>,
    date: DateTime<Utc>,
    delivered: bool,
    total_mrp: Option<Decimal>,
    total_wsp: Option<Decimal>,
    items: Json<Vec<OrderLine>>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            region: TagList::parse_optional(r.region.as_deref()),
            date: r.date,
            delivered: r.delivered,
            total_mrp: r.total_mrp,
            total_wsp: r.total_wsp,
            items: r.items.0,
        }
    }
}

/// Map a unique-constraint violation to `Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Store an empty tag list as NULL.
fn tags_column(tags: &TagList) -> Option<String> {
    (!tags.is_empty()).then(|| tags.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, RepositoryError> {
        let row: CustomerRow = sqlx::query_as(&format!(
            "INSERT INTO customer (email, first_name, last_name, password_hash, region) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.password_hash)
        .bind(tags_column(&new.region))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        Ok(row.into())
    }

    async fn customer(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn customer_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let row: Option<CustomerPasswordRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS}, password_hash FROM customer WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.customer.into(), r.password_hash)))
    }

    async fn save_cart(
        &self,
        email: &Email,
        expected_version: i64,
        cart: &Cart,
    ) -> Result<i64, RepositoryError> {
        let new_version: Option<i64> = sqlx::query_scalar(
            "UPDATE customer SET cart = $1, cart_version = cart_version + 1 \
             WHERE email = $2 AND cart_version = $3 \
             RETURNING cart_version",
        )
        .bind(Json(cart))
        .bind(email)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match new_version {
            Some(version) => Ok(version),
            None => Err(self.stale_cart_error(email).await?),
        }
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn upsert_product(&self, p: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, title, brand, category, brick, collection, gender, mrp, \
                                  wsp, style_code, style_2, image_1, image_2, image_3, image_4, \
                                  created, uploaded_by, go_live_date, style_region, stock_items, \
                                  is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21) \
             ON CONFLICT (id) DO UPDATE SET \
                title = EXCLUDED.title, brand = EXCLUDED.brand, \
                category = EXCLUDED.category, brick = EXCLUDED.brick, \
                collection = EXCLUDED.collection, gender = EXCLUDED.gender, \
                mrp = EXCLUDED.mrp, wsp = EXCLUDED.wsp, style_code = EXCLUDED.style_code, \
                style_2 = EXCLUDED.style_2, image_1 = EXCLUDED.image_1, \
                image_2 = EXCLUDED.image_2, image_3 = EXCLUDED.image_3, \
                image_4 = EXCLUDED.image_4, uploaded_by = EXCLUDED.uploaded_by, \
                go_live_date = EXCLUDED.go_live_date, style_region = EXCLUDED.style_region, \
                stock_items = EXCLUDED.stock_items, is_active = EXCLUDED.is_active",
        )
        .bind(p.id)
        .bind(&p.title)
        .bind(&p.brand)
        .bind(&p.category)
        .bind(&p.brick)
        .bind(&p.collection)
        .bind(&p.gender)
        .bind(p.mrp)
        .bind(p.wsp)
        .bind(&p.style_code)
        .bind(&p.style_2)
        .bind(&p.image_1)
        .bind(&p.image_2)
        .bind(&p.image_3)
        .bind(&p.image_4)
        .bind(p.created)
        .bind(&p.uploaded_by)
        .bind(p.go_live_date)
        .bind(&p.style_region)
        .bind(Json(&p.stock_items))
        .bind(p.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product title"))?;

        Ok(())
    }

    async fn commit_order(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the customer row and clear the cart only if nobody changed it.
        let cleared = sqlx::query(
            "UPDATE customer SET cart = '[]'::jsonb, cart_version = cart_version + 1 \
             WHERE email = $1 AND cart_version = $2",
        )
        .bind(&order.name)
        .bind(expected_cart_version)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.stale_cart_error(&order.name).await?);
        }

        sqlx::query(&format!(
            "INSERT INTO customer_order ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(order.id)
        .bind(&order.name)
        .bind(tags_column(&order.region))
        .bind(order.date)
        .bind(order.delivered)
        .bind(order.total_mrp)
        .bind(order.total_wsp)
        .bind(Json(&order.items))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE name = $1 ORDER BY date DESC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn set_delivered(&self, id: OrderId, delivered: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customer_order SET delivered = $1 WHERE id = $2")
            .bind(delivered)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
