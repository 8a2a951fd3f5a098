//! Cart routes. Every handler acts on the caller's own cart.

use axum::{
    Json,
    extract::{Path, State},
};

use shopx_core::CartItemId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::cart::{
    AddCartItem, Cart, CartItemSelection, CartSummary, InactiveShopItem, UpdateCartItem,
};
use crate::services::cart::CartService;
use crate::state::AppState;

/// GET /api/cart
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.pool()).get(user.id).await?))
}

/// GET /api/cart/summary
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartSummary>> {
    Ok(Json(CartService::new(state.pool()).summary(user.id).await?))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddCartItem>,
) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.pool()).add_item(user.id, &body).await?))
}

/// PUT /api/cart/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateCartItem>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool())
        .update_quantity(user.id, id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.pool()).remove_item(user.id, id).await?))
}

/// DELETE /api/cart
pub async fn clear(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.pool()).clear(user.id).await?))
}

/// POST /api/cart/inactive-shops
///
/// Which of the selected lines belong to shops that have closed.
pub async fn inactive_shops(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CartItemSelection>,
) -> Result<Json<Vec<InactiveShopItem>>> {
    let items = CartService::new(state.pool())
        .inactive_shops(user.id, &body.cart_item_ids)
        .await?;
    Ok(Json(items))
}
