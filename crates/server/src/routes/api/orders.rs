//! Order routes: checkout, listings per role, and status changes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use shopx_core::{OrderId, PageRequest, Paged};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth, RequireSeller};
use crate::models::order::{CreateOrderRequest, Order, OrderFilter, OrderSummary, UpdateOrderStatus};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// POST /api/orders
///
/// Checks out the selected cart lines, one order per seller.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Vec<Order>>)> {
    let orders = OrderService::new(state.pool())
        .create_from_cart(user.id, &body)
        .await?;
    let count = orders.len().to_string();
    add_breadcrumb("checkout", "Orders created", Some(&[("orders", count.as_str())][..]));
    Ok((StatusCode::CREATED, Json(orders)))
}

/// GET /api/orders/mine
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<OrderSummary>>> {
    let orders = OrderService::new(state.pool())
        .my_orders(user.id, &filter, page)
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/seller
pub async fn seller(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<OrderSummary>>> {
    let orders = OrderService::new(state.pool())
        .seller_orders(seller.seller_id, &filter, page)
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<OrderFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<OrderSummary>>> {
    let orders = OrderService::new(state.pool()).all_orders(&filter, page).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.pool()).detail(&user, id).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderStatus>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .update_status(&user, id, &body.status)
        .await?;
    let order_id = id.to_string();
    let data = [("order_id", order_id.as_str()), ("status", body.status.as_str())];
    add_breadcrumb("order", "Status changed", Some(&data[..]));
    Ok(Json(order))
}
