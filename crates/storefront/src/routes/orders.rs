//! Order route handlers.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::{OrderService, Placement};
use crate::state::AppState;

/// `GET /order`: place an order from the current cart.
///
/// An out-of-stock line is not an HTTP error: the response is 200 with
/// `{"error": "<stock title> is Out Of Stock."}` and nothing is written.
#[instrument(skip(state))]
pub async fn place(State(state): State<AppState>, RequireAuth(email): RequireAuth) -> Result<Json<Value>> {
    match OrderService::new(state.store()).place(&email).await? {
        Placement::Placed(order) => {
            let order_id = order.id.to_string();
            add_breadcrumb("order", "Order placed", Some(&[("order_id", order_id.as_str())]));
            Ok(Json(json!({ "message": "Order placed", "order_id": order_id })))
        }
        Placement::OutOfStock { title } => {
            Ok(Json(json!({ "error": format!("{title} is Out Of Stock.") })))
        }
    }
}

/// `GET /orders`: the customer's orders, newest first.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.store()).history(&email).await?;
    Ok(Json(orders))
}
