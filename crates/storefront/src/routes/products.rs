//! Product route handlers.

use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopipy_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::services::{Catalog, SortBy};
use crate::state::AppState;

/// Product fields without `stock_items`.
///
/// Used where a single stock unit is shown in its place.
#[derive(Debug, Serialize)]
pub struct ProductView<'a> {
    pub id: ProductId,
    pub title: &'a str,
    pub brand: Option<&'a str>,
    pub category: Option<&'a str>,
    pub brick: Option<&'a str>,
    pub collection: Option<&'a str>,
    pub gender: &'a str,
    pub mrp: Option<Decimal>,
    pub wsp: Option<Decimal>,
    pub style_code: Option<&'a str>,
    pub style_2: Option<&'a str>,
    pub image_1: Option<&'a str>,
    pub image_2: Option<&'a str>,
    pub image_3: Option<&'a str>,
    pub image_4: Option<&'a str>,
    pub created: DateTime<Utc>,
    pub uploaded_by: Option<&'a str>,
    pub go_live_date: DateTime<Utc>,
    pub style_region: Option<&'a str>,
    pub is_active: bool,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            id: p.id,
            title: &p.title,
            brand: p.brand.as_deref(),
            category: p.category.as_deref(),
            brick: p.brick.as_deref(),
            collection: p.collection.as_deref(),
            gender: &p.gender,
            mrp: p.mrp,
            wsp: p.wsp,
            style_code: p.style_code.as_deref(),
            style_2: p.style_2.as_deref(),
            image_1: p.image_1.as_deref(),
            image_2: p.image_2.as_deref(),
            image_3: p.image_3.as_deref(),
            image_4: p.image_4.as_deref(),
            created: p.created,
            uploaded_by: p.uploaded_by.as_deref(),
            go_live_date: p.go_live_date,
            style_region: p.style_region.as_deref(),
            is_active: p.is_active,
        }
    }
}

/// Query parameters for the guest listing.
#[derive(Debug, Deserialize, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Path parameters for the product detail route.
#[derive(Debug, Deserialize, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ItemPath {
    pub id: String,
}

/// Path parameters for the filter route.
#[derive(Debug, Deserialize, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct FilterPath {
    pub item_type: String,
    pub category: String,
    pub gender: String,
    pub sort_by: String,
}

/// `GET /products`: products in the customer's regions (all if none).
#[instrument(skip(state))]
pub async fn for_customer(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let customer = state
        .store()
        .customer(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let products = Catalog::new(state.store())
        .list_for_regions(&customer.region)
        .await?;
    Ok(Json(products))
}

/// `GET /products/guest?page=N`: one page of five products.
#[instrument(skip(state))]
pub async fn guest(
    State(state): State<AppState>,
    query: PageQuery,
) -> Result<Json<Vec<Product>>> {
    let page = Catalog::new(state.store())
        .guest_page(query.page.as_deref())
        .await?;
    tracing::debug!(page = page.number, pages = page.num_pages, "Guest page");
    Ok(Json(page.items))
}

/// `GET /products/item/{id}`: a single product.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, path: ItemPath) -> Result<Json<Product>> {
    let product = Catalog::new(state.store()).get_by_id(&path.id).await?;
    Ok(Json(product))
}

/// `GET /products/filter/{item_type}/{category}/{gender}/{sort_by}/search`.
#[instrument(skip(state))]
pub async fn filter(
    State(state): State<AppState>,
    path: FilterPath,
) -> Result<Json<Vec<Product>>> {
    let products = Catalog::new(state.store())
        .filter(
            &path.item_type,
            &path.category,
            &path.gender,
            SortBy::parse(&path.sort_by),
        )
        .await?;
    Ok(Json(products))
}
