//! Product routes: the public storefront plus the seller's own catalog.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{CategoryId, PageRequest, Paged, ProductId};

use crate::error::Result;
use crate::middleware::RequireSeller;
use crate::models::catalog::{
    DeleteProductQuery, LimitQuery, Product, ProductFilter, ProductInput, SellerProductFilter,
    SortQuery,
};
use crate::services::catalog::ProductService;
use crate::state::AppState;

/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Product>>> {
    Ok(Json(ProductService::new(state.pool()).list(&filter, page).await?))
}

/// GET /api/products/best-selling
pub async fn best_selling(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.pool())
        .best_selling(limit.clamped())
        .await?;
    Ok(Json(products))
}

/// GET /api/products/newest
pub async fn newest(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductService::new(state.pool()).newest(limit.clamped()).await?))
}

/// GET /api/products/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    Ok(Json(ProductService::new(state.pool()).detail(id).await?))
}

/// GET /api/products/category/{id}
pub async fn by_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Query(sort): Query<SortQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Product>>> {
    let products = ProductService::new(state.pool())
        .by_category(id, sort.sort.as_deref(), page)
        .await?;
    Ok(Json(products))
}

/// GET /api/products/mine
pub async fn mine(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(filter): Query<SellerProductFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Product>>> {
    let products = ProductService::new(state.pool())
        .seller_list(seller.seller_id, &filter, page)
        .await?;
    Ok(Json(products))
}

/// GET /api/products/mine/{id}
pub async fn mine_one(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool())
        .get_own(seller.seller_id, id)
        .await?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    seller: RequireSeller,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.pool())
        .create(seller.seller_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool())
        .update(seller.seller_id, id, &body)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}?hard=
pub async fn delete(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<ProductId>,
    Query(query): Query<DeleteProductQuery>,
) -> Result<StatusCode> {
    ProductService::new(state.pool())
        .delete(seller.seller_id, id, query.hard)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
