//! Discount code routes. Management is admin-only; customers can browse
//! and validate codes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{DiscountId, PageRequest, Paged};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::discount::{
    CodeLookupQuery, Discount, DiscountActivation, DiscountCreate, DiscountFilter, DiscountUpdate,
    DiscountValidation,
};
use crate::services::discounts::DiscountService;
use crate::state::AppState;

/// GET /api/discounts
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<DiscountFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Discount>>> {
    Ok(Json(DiscountService::new(state.pool()).list(&filter, page).await?))
}

/// GET /api/discounts/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DiscountId>,
) -> Result<Json<Discount>> {
    Ok(Json(DiscountService::new(state.pool()).get(id).await?))
}

/// POST /api/discounts
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<DiscountCreate>,
) -> Result<(StatusCode, Json<Discount>)> {
    let discount = DiscountService::new(state.pool()).create(&body).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

/// PUT /api/discounts/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DiscountId>,
    Json(body): Json<DiscountUpdate>,
) -> Result<Json<Discount>> {
    Ok(Json(DiscountService::new(state.pool()).update(id, &body).await?))
}

/// PUT /api/discounts/{id}/active
pub async fn set_active(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DiscountId>,
    Json(body): Json<DiscountActivation>,
) -> Result<Json<Discount>> {
    let discount = DiscountService::new(state.pool())
        .set_active(id, body.is_active)
        .await?;
    Ok(Json(discount))
}

/// DELETE /api/discounts/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DiscountId>,
) -> Result<StatusCode> {
    DiscountService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/discounts/available
pub async fn available(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> Result<Json<Vec<Discount>>> {
    Ok(Json(DiscountService::new(state.pool()).available().await?))
}

/// GET /api/discounts/code/{code}
pub async fn by_code(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(code): Path<String>,
    Query(query): Query<CodeLookupQuery>,
) -> Result<Json<Discount>> {
    let discount = DiscountService::new(state.pool())
        .get_by_code(&code, query.check_validity)
        .await?;
    Ok(Json(discount))
}

/// GET /api/discounts/validate/{code}
///
/// Always 200; the body says whether the code can be used.
pub async fn validate(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(code): Path<String>,
) -> Result<Json<DiscountValidation>> {
    Ok(Json(DiscountService::new(state.pool()).validate(&code).await?))
}
