//! Admin account management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{PageRequest, Paged, UserId};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::user::{AdminUserCreate, AdminUserUpdate, SetRoleRequest, User, UserFilter, UserSummary};
use crate::services::users::UserService;
use crate::state::AppState;

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<UserSummary>>> {
    Ok(Json(UserService::new(state.pool()).list(&filter, page).await?))
}

/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    Ok(Json(UserService::new(state.pool()).get(id).await?))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<User>)> {
    let user = UserService::new(state.pool()).create(&body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<AdminUserUpdate>,
) -> Result<Json<User>> {
    Ok(Json(UserService::new(state.pool()).update(id, &body).await?))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    UserService::new(state.pool()).delete(admin.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/{id}/role
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .set_role(admin.id, id, &body)
        .await?;
    Ok(Json(user))
}
