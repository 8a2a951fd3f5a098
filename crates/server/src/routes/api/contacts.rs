//! Contact messages: users write them, admins triage them.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{ContactId, PageRequest, Paged};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::contact::{Contact, ContactCreate, ContactFilter, ContactStatusUpdate};
use crate::services::contacts::ContactService;
use crate::state::AppState;

/// POST /api/contacts
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ContactCreate>,
) -> Result<(StatusCode, Json<Contact>)> {
    let contact = ContactService::new(state.pool())
        .create(user.id, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/contacts
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<ContactFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Contact>>> {
    Ok(Json(ContactService::new(state.pool()).list(&filter, page).await?))
}

/// GET /api/contacts/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ContactId>,
) -> Result<Json<Contact>> {
    Ok(Json(ContactService::new(state.pool()).get(id).await?))
}

/// PUT /api/contacts/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ContactId>,
    Json(body): Json<ContactStatusUpdate>,
) -> Result<Json<Contact>> {
    let contact = ContactService::new(state.pool())
        .update_status(id, &body.status)
        .await?;
    Ok(Json(contact))
}

/// DELETE /api/contacts/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ContactId>,
) -> Result<StatusCode> {
    ContactService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
