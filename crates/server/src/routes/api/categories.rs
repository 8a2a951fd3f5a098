//! Platform category routes. Reads are public, writes are admin-only.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{CategoryId, PageRequest, Paged};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::catalog::{Category, CategoryInput, SearchQuery};
use crate::services::catalog::CategoryService;
use crate::state::AppState;

fn service(state: &AppState) -> CategoryService<'_> {
    CategoryService::new(state.pool(), state.category_cache())
}

/// GET /api/categories
pub async fn list(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Category>>> {
    Ok(Json(service(&state).list(search.search.as_deref(), page).await?))
}

/// GET /api/categories/all
pub async fn all(State(state): State<AppState>) -> Result<Json<Arc<Vec<Category>>>> {
    Ok(Json(service(&state).all().await?))
}

/// GET /api/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(service(&state).get(id).await?))
}

/// POST /api/categories
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = service(&state).create(&body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(service(&state).update(id, &body).await?))
}

/// DELETE /api/categories/{id}
///
/// Products in the category move to the default category.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
