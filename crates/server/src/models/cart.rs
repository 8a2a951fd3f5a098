//! Cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::{CartId, CartItemId, ProductId, SellerId};

/// A user's cart with its lines and totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartLine>,
    pub total_quantity: i64,
    pub total_price: Decimal,
}

/// One cart line joined with the current product and shop state.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub available_stock: i32,
    pub product_is_active: bool,
    pub seller_id: SellerId,
    pub shop_name: String,
    pub shop_is_active: bool,
    pub added_at: DateTime<Utc>,
}

/// Totals for the cart badge and checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub line_count: i64,
    pub total_quantity: i64,
    pub total_price: Decimal,
}

/// Add-to-cart body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Change-quantity body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

/// Body listing a subset of cart items, used to check shops before checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemSelection {
    pub cart_item_ids: Vec<CartItemId>,
}

/// A selected cart item whose shop is no longer active.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InactiveShopItem {
    pub cart_item_id: CartItemId,
    pub product_name: String,
    pub seller_id: SellerId,
    pub shop_name: String,
}

/// A selected cart item as loaded for checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckoutLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub quantity: i32,
}
