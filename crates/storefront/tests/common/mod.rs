//! Shared fixtures for HTTP tests: an app over `MemoryStore`, request
//! helpers, and a product builder.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use shopipy_core::{Email, ProductId, TagList};
use shopipy_storefront::config::TokenConfig;
use shopipy_storefront::db::{MemoryStore, Store};
use shopipy_storefront::models::{NewCustomer, Product, StockUnit, SubItem};
use shopipy_storefront::routes;
use shopipy_storefront::state::AppState;

pub const ACCESS_KEY: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6v";
pub const REFRESH_KEY: &str = "Zc6^4Wu*0Tr&7Qp#5Ln@2Km!9Yx$3Ba8";

/// A response with its body decoded.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub text: String,
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenConfig::new(
            SecretString::from(ACCESS_KEY),
            SecretString::from(REFRESH_KEY),
        );
        let state = AppState::new(&tokens, store.clone());
        Self { state, store }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let app = routes::normalize_paths(routes::router(self.state.clone()));
        let response = app.oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Sign up and return the access token.
    pub async fn signup(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/signup",
                None,
                &serde_json::json!({
                    "firstName": "Test",
                    "lastName": "Customer",
                    "email": email,
                    "password": password,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.body["access_token"].as_str().unwrap().to_string()
    }

    /// Insert a customer directly and return an access token for them.
    pub async fn customer_with_regions(&self, email: &str, regions: &str) -> String {
        let email = Email::parse(email).unwrap();
        self.store
            .create_customer(NewCustomer {
                email: email.clone(),
                first_name: "Region".to_string(),
                last_name: "Tester".to_string(),
                password_hash: String::new(),
                region: TagList::parse(regions),
            })
            .await
            .unwrap();
        self.state.tokens().issue_access_token(&email).unwrap()
    }

    pub async fn seed(&self, product: &Product) {
        self.store.upsert_product(product).await.unwrap();
    }
}

/// A product with one tracked stock unit whose id is `s-<title>` and whose
/// title is `<title> / M`.
pub fn product(title: &str, mrp: Option<i64>, stock: u32) -> Product {
    let mut items = BTreeMap::new();
    items.insert(
        "M".to_string(),
        SubItem {
            qty: stock,
            attributes: serde_json::Map::new(),
        },
    );
    let mut stock_items = BTreeMap::new();
    stock_items.insert(
        "default".to_string(),
        StockUnit {
            id: Some(format!("s-{title}")),
            title: format!("{title} / M"),
            total: Some(stock),
            discount: None,
            items,
        },
    );

    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Product {
        id: ProductId::new(),
        title: title.to_string(),
        brand: Some("Acme".to_string()),
        category: Some("Shirts".to_string()),
        brick: Some("Kurta".to_string()),
        collection: None,
        gender: "Men".to_string(),
        mrp: mrp.map(Decimal::from),
        wsp: None,
        style_code: None,
        style_2: None,
        image_1: None,
        image_2: None,
        image_3: None,
        image_4: None,
        created,
        uploaded_by: None,
        go_live_date: created,
        style_region: None,
        stock_items,
        is_active: true,
    }
}
