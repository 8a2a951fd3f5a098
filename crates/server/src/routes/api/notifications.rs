//! Broadcast management for admins, seller announcements to their own
//! buyers, and the per-user inbox.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use shopx_core::{NotificationId, PageRequest, Paged, UserNotificationId};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth, RequireSeller};
use crate::models::notification::{
    AudienceQuery, InboxItem, InboxQuery, Notification, NotificationFilter, NotificationInput,
    NotificationRecipient, NotificationStats, RecipientCount, SellerCustomer,
    SellerNotificationFilter, SellerNotificationInput, UnreadCount,
};
use crate::services::notifications::NotificationService;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<NotificationFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Notification>>> {
    let items = NotificationService::new(state.pool()).list(&filter, page).await?;
    Ok(Json(items))
}

/// GET /api/notifications/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    Ok(Json(NotificationService::new(state.pool()).get(id).await?))
}

/// POST /api/notifications
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NotificationInput>,
) -> Result<(StatusCode, Json<Notification>)> {
    let notification = NotificationService::new(state.pool())
        .create(admin.id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// PUT /api/notifications/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<NotificationId>,
    Json(body): Json<NotificationInput>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .update(id, &body)
        .await?;
    Ok(Json(notification))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    NotificationService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/{id}/send
pub async fn send(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .send(id, Utc::now())
        .await?;
    Ok(Json(notification))
}

/// GET /api/notifications/recipient-count?audience=
pub async fn recipient_count(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<AudienceQuery>,
) -> Result<Json<RecipientCount>> {
    let count = NotificationService::new(state.pool())
        .recipient_count(query.audience)
        .await?;
    Ok(Json(count))
}

/// GET /api/notifications/{id}/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationStats>> {
    Ok(Json(NotificationService::new(state.pool()).stats(id).await?))
}

/// GET /api/notifications/seller
pub async fn seller_list(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(filter): Query<SellerNotificationFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<Notification>>> {
    let items = NotificationService::new(state.pool())
        .seller_list(seller.seller_id, &filter, page)
        .await?;
    Ok(Json(items))
}

/// POST /api/notifications/seller
pub async fn seller_create(
    State(state): State<AppState>,
    seller: RequireSeller,
    Json(body): Json<SellerNotificationInput>,
) -> Result<(StatusCode, Json<Notification>)> {
    let notification = NotificationService::new(state.pool())
        .seller_create(seller.seller_id, seller.user.id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/notifications/seller/customers
pub async fn seller_customers(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<Vec<SellerCustomer>>> {
    let customers = NotificationService::new(state.pool())
        .seller_customers(seller.seller_id)
        .await?;
    Ok(Json(customers))
}

/// GET /api/notifications/seller/{id}
pub async fn seller_show(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .seller_get(seller.seller_id, id)
        .await?;
    Ok(Json(notification))
}

/// PUT /api/notifications/seller/{id}
pub async fn seller_update(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
    Json(body): Json<SellerNotificationInput>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .seller_update(seller.seller_id, id, &body)
        .await?;
    Ok(Json(notification))
}

/// DELETE /api/notifications/seller/{id}
pub async fn seller_delete(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    NotificationService::new(state.pool())
        .seller_delete(seller.seller_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/seller/{id}/send
pub async fn seller_send(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .seller_send(seller.seller_id, id, Utc::now())
        .await?;
    Ok(Json(notification))
}

/// GET /api/notifications/seller/{id}/stats
pub async fn seller_stats(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationStats>> {
    let stats = NotificationService::new(state.pool())
        .seller_stats(seller.seller_id, id)
        .await?;
    Ok(Json(stats))
}

/// GET /api/notifications/seller/{id}/recipients
pub async fn seller_recipients(
    State(state): State<AppState>,
    seller: RequireSeller,
    Path(id): Path<NotificationId>,
) -> Result<Json<Vec<NotificationRecipient>>> {
    let recipients = NotificationService::new(state.pool())
        .seller_recipients(seller.seller_id, id)
        .await?;
    Ok(Json(recipients))
}

/// GET /api/inbox
pub async fn inbox(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<InboxQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<InboxItem>>> {
    let items = NotificationService::new(state.pool())
        .inbox(user.id, query.unread_only, page)
        .await?;
    Ok(Json(items))
}

/// PUT /api/inbox/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UserNotificationId>,
) -> Result<StatusCode> {
    NotificationService::new(state.pool()).mark_read(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/inbox/{id}
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UserNotificationId>,
) -> Result<StatusCode> {
    NotificationService::new(state.pool())
        .remove_from_inbox(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/inbox/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UnreadCount>> {
    let unread = NotificationService::new(state.pool()).unread_count(user.id).await?;
    Ok(Json(UnreadCount { unread }))
}
