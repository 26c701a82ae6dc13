//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Status check
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store ping)
//!
//! # Accounts
//! POST /signup                 - Register, returns token pair
//! POST /login                  - Login, returns token pair
//! POST /refresh-token          - New access token from a refresh token
//! POST /logout                 - Expire token cookies
//!
//! # Cart (bearer)
//! GET  /cart                   - Stored cart lines
//! GET  /cart_data              - Cart lines resolved against the catalog
//! POST /cart/save              - Add a line (idempotent per stock_id)
//! POST /cart/update            - Remove a stock_id
//!
//! # Orders (bearer)
//! GET  /order                  - Place an order from the cart
//! GET  /orders                 - Order history
//!
//! # Products
//! GET  /products               - Products in the customer's regions (bearer)
//! GET  /products/guest         - Paginated listing, ?page=N
//! GET  /products/item/{id}     - Product detail
//! GET  /products/filter/{item_type}/{category}/{gender}/{sort_by}/search
//! ```
//!
//! Paths are accepted with or without a trailing slash when the router is
//! wrapped with [`normalize_paths`].

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{auth_gate, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// JSON request body whose rejection is a JSON `AppError`.
///
/// Malformed or mistyped bodies answer `400 {"error": "Invalid JSON data"}`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                log_rejection(&rejection);
                Err(AppError::BadRequest("Invalid JSON data".to_string()))
            }
        }
    }
}

fn log_rejection(rejection: &JsonRejection) {
    tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
}

/// Create the account routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
}

/// Create the cart and order routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart_data", get(cart::resolved))
        .route("/cart/save", post(cart::save))
        .route("/cart/update", post(cart::update))
        .route("/order", get(orders::place))
        .route("/orders", get(orders::history))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::for_customer))
        .route("/products/guest", get(products::guest))
        .route("/products/item/{id}", get(products::show))
        .route(
            "/products/filter/{item_type}/{category}/{gender}/{sort_by}/search",
            get(products::filter),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::status_check))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .merge(cart_routes())
        .merge(product_routes())
}

/// The full application: routes, JSON fallbacks, and the middleware stack.
pub fn router(state: AppState) -> Router {
    routes()
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(from_fn_with_state(state.clone(), auth_gate))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        customer = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Accept every path with or without a trailing slash.
///
/// Must wrap the router from the outside; a layer added with
/// `Router::layer` runs after routing.
pub fn normalize_paths<S>(service: S) -> NormalizePath<S> {
    NormalizePathLayer::trim_trailing_slash().layer(service)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
