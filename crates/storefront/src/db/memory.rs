//! In-memory store.
//!
//! All tables sit behind one lock, so multi-table writes such as
//! [`Store::commit_order`] are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use shopipy_core::{Email, OrderId, ProductId};

use super::{RepositoryError, Store};
use crate::models::{Cart, Customer, NewCustomer, Order, Product};

#[derive(Default)]
struct Tables {
    customers: HashMap<Email, (Customer, String)>,
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
}

/// In-memory implementation of [`Store`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders recorded so far.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_customer(&self, new: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.customers.contains_key(&new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let customer = Customer {
            email: new.email.clone(),
            first_name: new.first_name,
            last_name: new.last_name,
            region: new.region,
            is_active: true,
            cart: Cart::new(),
            cart_version: 0,
            date_joined: Utc::now(),
        };
        tables
            .customers
            .insert(new.email, (customer.clone(), new.password_hash));
        Ok(customer)
    }

    async fn customer(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(email).map(|(c, _)| c.clone()))
    }

    async fn customer_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(email).cloned())
    }

    async fn save_cart(
        &self,
        email: &Email,
        expected_version: i64,
        cart: &Cart,
    ) -> Result<i64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let (customer, _) = tables
            .customers
            .get_mut(email)
            .ok_or(RepositoryError::NotFound)?;

        if customer.cart_version != expected_version {
            return Err(RepositoryError::Conflict("cart was modified".to_owned()));
        }

        customer.cart = cart.clone();
        customer.cart_version += 1;
        Ok(customer.cart_version)
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .products
            .values()
            .any(|p| p.title == product.title && p.id != product.id)
        {
            return Err(RepositoryError::Conflict(
                "product title already exists".to_owned(),
            ));
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn commit_order(
        &self,
        order: &Order,
        expected_cart_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let (customer, _) = tables
            .customers
            .get_mut(&order.name)
            .ok_or(RepositoryError::NotFound)?;

        if customer.cart_version != expected_cart_version {
            return Err(RepositoryError::Conflict("cart was modified".to_owned()));
        }

        customer.cart = Cart::new();
        customer.cart_version += 1;
        tables.orders.push(order.clone());
        Ok(())
    }

    async fn orders_for(&self, email: &Email) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| &o.name == email)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }

    async fn set_delivered(&self, id: OrderId, delivered: bool) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.delivered = delivered;
        Ok(())
    }
}
