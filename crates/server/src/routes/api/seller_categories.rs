//! A seller's own category routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use shopx_core::SellerCategoryId;

use crate::error::Result;
use crate::middleware::RequireSeller;
use crate::models::catalog::{SellerCategory, SellerCategoryInput};
use crate::services::catalog::SellerCategoryService;
use crate::state::AppState;

/// GET /api/seller-categories
pub async fn list(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<Vec<SellerCategory>>> {
    let categories = SellerCategoryService::new(state.pool())
        .list_own(seller.seller_id)
        .await?;
    Ok(Json(categories))
}

/// GET /api/seller-categories/{id}
pub async fn show(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<SellerCategoryId>,
) -> Result<Json<SellerCategory>> {
    let category = SellerCategoryService::new(state.pool())
        .get_own(seller.seller_id, id)
        .await?;
    Ok(Json(category))
}

/// POST /api/seller-categories
pub async fn create(
    State(state): State<AppState>,
    seller: RequireSeller,
    Json(body): Json<SellerCategoryInput>,
) -> Result<(StatusCode, Json<SellerCategory>)> {
    let category = SellerCategoryService::new(state.pool())
        .create(seller.seller_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/seller-categories/{id}
pub async fn update(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<SellerCategoryId>,
    Json(body): Json<SellerCategoryInput>,
) -> Result<Json<SellerCategory>> {
    let category = SellerCategoryService::new(state.pool())
        .update(seller.seller_id, id, &body)
        .await?;
    Ok(Json(category))
}

/// DELETE /api/seller-categories/{id}
pub async fn delete(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<SellerCategoryId>,
) -> Result<StatusCode> {
    SellerCategoryService::new(state.pool())
        .delete(seller.seller_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
