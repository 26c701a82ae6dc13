//! Cart and order endpoints, including the full signup-to-order flow.

#![allow(clippy::unwrap_used)]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use common::{TestApp, product};

#[tokio::test]
async fn test_signup_to_order_flow() {
    let app = TestApp::new();
    let shirt = product("Shirt", Some(100), 5);
    app.seed(&shirt).await;

    app.signup("a@x.com", "p").await;
    let login = app
        .post("/login", None, &json!({"email": "a@x.com", "password": "p"}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["access_token"].as_str().unwrap().to_string();

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.body, json!({"cart_data": []}));

    let added = app
        .post(
            "/cart/save",
            Some(&token),
            &json!({"stock_id": "s-Shirt", "post_id": shirt.id.to_string(), "volume": 2}),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body, json!({"Message": "Item added"}));

    let order = app.get("/order", Some(&token)).await;
    assert_eq!(order.status, StatusCode::OK);
    assert_eq!(order.body["message"], "Order placed");
    assert!(order.body["order_id"].is_string());

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.body, json!({"cart_data": []}));

    let history = app.get("/orders", Some(&token)).await;
    assert_eq!(history.status, StatusCode::OK);
    let orders = history.body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["name"], "a@x.com");
    assert_eq!(orders[0]["delivered"], false);
    assert_eq!(orders[0]["items"][0]["stock_title"], "Shirt / M");
    assert_eq!(orders[0]["items"][0]["volume"], 2);
}

#[tokio::test]
async fn test_save_is_idempotent_per_stock_id() {
    let app = TestApp::new();
    let token = app.signup("a@x.com", "p").await;

    let body = json!({"stock_id": "s1", "post_id": "p1", "volume": 2});
    app.post("/cart/save", Some(&token), &body).await;
    let again = app
        .post(
            "/cart/save",
            Some(&token),
            &json!({"stock_id": "s1", "post_id": "p2", "volume": 9}),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body, json!({"Message": "Item already in cart"}));

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(
        cart.body,
        json!({"cart_data": [{"stock_id": "s1", "item_id": "p1", "volume": 2}]})
    );
}

#[tokio::test]
async fn test_save_rejects_invalid_data() {
    let app = TestApp::new();
    let token = app.signup("a@x.com", "p").await;

    let zero = app
        .post(
            "/cart/save",
            Some(&token),
            &json!({"stock_id": "s1", "post_id": "p1", "volume": 0}),
        )
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.body, json!({"error": "Invalid data format"}));

    let missing = app
        .post("/cart/save", Some(&token), &json!({"stock_id": "s1"}))
        .await;
    assert_eq!(missing.body, json!({"error": "Invalid data format"}));

    let malformed = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/cart/save")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body, json!({"error": "Invalid JSON data"}));
}

#[tokio::test]
async fn test_update_removes_stock_id() {
    let app = TestApp::new();
    let token = app.signup("a@x.com", "p").await;
    for stock_id in ["s1", "s2"] {
        app.post(
            "/cart/save",
            Some(&token),
            &json!({"stock_id": stock_id, "post_id": "p1", "volume": 1}),
        )
        .await;
    }

    let absent = app
        .post("/cart/update", Some(&token), &json!({"stock_id": "zzz"}))
        .await;
    assert_eq!(absent.status, StatusCode::OK);
    assert_eq!(absent.body["cart_data"].as_array().unwrap().len(), 2);

    let removed = app
        .post("/cart/update", Some(&token), &json!({"stock_id": "s1"}))
        .await;
    assert_eq!(
        removed.body,
        json!({"cart_data": [{"stock_id": "s2", "item_id": "p1", "volume": 1}]})
    );

    let empty_id = app
        .post("/cart/update", Some(&token), &json!({"stock_id": ""}))
        .await;
    assert_eq!(empty_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_data_resolves_stock_unit() {
    let app = TestApp::new();
    let shirt = product("Shirt", Some(100), 5);
    app.seed(&shirt).await;
    let token = app.signup("a@x.com", "p").await;
    app.post(
        "/cart/save",
        Some(&token),
        &json!({"stock_id": "s-Shirt", "post_id": shirt.id.to_string(), "volume": 3}),
    )
    .await;

    let response = app.get("/cart_data", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let line = &response.body["cart_data"][0];
    assert_eq!(line["title"], "Shirt");
    assert_eq!(line["id"], shirt.id.to_string());
    assert_eq!(line["stock_items"]["title"], "Shirt / M");
    assert_eq!(line["stock_items"]["total"], 5);
    assert_eq!(line["volume"], 3);
}

#[tokio::test]
async fn test_cart_data_fails_on_missing_product() {
    let app = TestApp::new();
    let token = app.signup("a@x.com", "p").await;
    app.post(
        "/cart/save",
        Some(&token),
        &json!({"stock_id": "s1", "post_id": shopipy_core::ProductId::new().to_string(), "volume": 1}),
    )
    .await;

    let response = app.get("/cart_data", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Product not found."}));
}

#[tokio::test]
async fn test_out_of_stock_is_soft_failure() {
    let app = TestApp::new();
    let shirt = product("Shirt", Some(100), 3);
    app.seed(&shirt).await;
    let token = app.signup("a@x.com", "p").await;
    app.post(
        "/cart/save",
        Some(&token),
        &json!({"stock_id": "s-Shirt", "post_id": shirt.id.to_string(), "volume": 10}),
    )
    .await;

    let response = app.get("/order", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"error": "Shirt / M is Out Of Stock."}));

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.body["cart_data"].as_array().unwrap().len(), 1);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_order_with_empty_cart() {
    let app = TestApp::new();
    let token = app.signup("a@x.com", "p").await;

    let response = app.get("/order", Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"error": "Cart is empty"}));
}

#[tokio::test]
async fn test_order_requires_authentication() {
    let app = TestApp::new();
    let response = app.get("/order", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
