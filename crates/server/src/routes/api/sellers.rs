//! Seller storefront pages and the shop owner's own profile.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use shopx_core::{PageRequest, Paged, SellerId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::catalog::{Product, SellerCategory, SellerProductFilter};
use crate::models::seller::{Seller, SellerPublicProfile, SellerPublicStats, ShopNameRequest};
use crate::models::user::AuthResponse;
use crate::services::catalog::{ProductService, SellerCategoryService};
use crate::services::sellers::SellerService;
use crate::state::AppState;

/// GET /api/sellers/{id}
pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
) -> Result<Json<SellerPublicProfile>> {
    Ok(Json(SellerService::new(state.pool()).public_profile(id).await?))
}

/// GET /api/sellers/{id}/products
pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
    Query(filter): Query<SellerProductFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Product>>> {
    let products = ProductService::new(state.pool())
        .by_seller(id, &filter, page)
        .await?;
    Ok(Json(products))
}

/// GET /api/sellers/{id}/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
) -> Result<Json<SellerPublicStats>> {
    Ok(Json(SellerService::new(state.pool()).public_stats(id).await?))
}

/// GET /api/sellers/{id}/active
pub async fn active(State(state): State<AppState>, Path(id): Path<SellerId>) -> Result<Json<Value>> {
    let is_active = SellerService::new(state.pool()).is_active(id).await?;
    Ok(Json(json!({ "seller_id": id, "is_active": is_active })))
}

/// GET /api/sellers/{id}/categories
pub async fn categories(
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
) -> Result<Json<Vec<SellerCategory>>> {
    Ok(Json(SellerCategoryService::new(state.pool()).public_list(id).await?))
}

/// POST /api/sellers/convert
///
/// Turns the caller's account into a seller and returns a fresh token
/// carrying the new role.
pub async fn convert(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ShopNameRequest>,
) -> Result<Json<AuthResponse>> {
    let response = SellerService::new(state.pool())
        .become_seller(state.jwt(), user.id, &body.shop_name)
        .await?;
    Ok(Json(response))
}

/// GET /api/sellers/current
pub async fn current(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Seller>> {
    Ok(Json(SellerService::new(state.pool()).current(user.id).await?))
}

/// PUT /api/sellers/current
pub async fn rename(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ShopNameRequest>,
) -> Result<Json<Seller>> {
    let seller = SellerService::new(state.pool())
        .rename(user.id, &body.shop_name)
        .await?;
    Ok(Json(seller))
}
