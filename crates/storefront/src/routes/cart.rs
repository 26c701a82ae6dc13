//! Cart route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::JsonBody;
use super::products::ProductView;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Cart, StockUnit};
use crate::services::{AddOutcome, CartLedger, ResolvedLine};
use crate::state::AppState;

/// `POST /cart/save` body. `post_id` is the product id.
#[derive(Debug, Deserialize)]
pub struct SaveCartRequest {
    #[serde(default)]
    pub stock_id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub volume: u32,
}

/// `POST /cart/update` body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    #[serde(default)]
    pub stock_id: String,
}

/// `{"cart_data": [...]}` envelope.
#[derive(Debug, Serialize)]
pub struct CartData<T> {
    pub cart_data: T,
}

/// A cart line resolved for display: the product with only the selected
/// stock unit in place of `stock_items`.
#[derive(Debug, Serialize)]
pub struct CartItemView<'a> {
    #[serde(flatten)]
    pub product: ProductView<'a>,
    pub stock_items: &'a StockUnit,
    pub volume: u32,
}

impl<'a> From<&'a ResolvedLine> for CartItemView<'a> {
    fn from(line: &'a ResolvedLine) -> Self {
        Self {
            product: ProductView::from(&line.product),
            stock_items: &line.unit,
            volume: line.volume,
        }
    }
}

/// `GET /cart`: the stored cart lines.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
) -> Result<Json<CartData<Cart>>> {
    let cart = CartLedger::new(state.store()).fetch(&email).await?;
    Ok(Json(CartData { cart_data: cart }))
}

/// `GET /cart_data`: cart lines resolved against the catalog.
#[instrument(skip(state))]
pub async fn resolved(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
) -> Result<Json<Value>> {
    let lines = CartLedger::new(state.store()).fetch_resolved(&email).await?;
    let views: Vec<CartItemView<'_>> = lines.iter().map(CartItemView::from).collect();
    Ok(Json(json!({ "cart_data": views })))
}

/// `POST /cart/save`: add a line unless the stock unit is already there.
#[instrument(skip(state, body), fields(stock_id = %body.stock_id))]
pub async fn save(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
    JsonBody(body): JsonBody<SaveCartRequest>,
) -> Result<Json<Value>> {
    let outcome = CartLedger::new(state.store())
        .add(&email, &body.stock_id, &body.post_id, body.volume)
        .await?;

    let message = match outcome {
        AddOutcome::Added(_) => {
            add_breadcrumb("cart", "Added stock unit", Some(&[("stock_id", body.stock_id.as_str())]));
            "Item added"
        }
        AddOutcome::AlreadyPresent => "Item already in cart",
    };
    Ok(Json(json!({ "Message": message })))
}

/// `POST /cart/update`: remove a stock unit and return the resulting cart.
#[instrument(skip(state, body), fields(stock_id = %body.stock_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
    JsonBody(body): JsonBody<UpdateCartRequest>,
) -> Result<Json<CartData<Cart>>> {
    let cart = CartLedger::new(state.store())
        .remove(&email, &body.stock_id)
        .await?;
    Ok(Json(CartData { cart_data: cart }))
}
