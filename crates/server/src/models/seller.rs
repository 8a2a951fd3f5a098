//! Seller profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopx_core::{SellerCategoryId, SellerId, UserId};

/// A seller profile, 1-1 with its owning user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Seller {
    pub id: SellerId,
    pub user_id: UserId,
    pub shop_name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Public storefront page for a seller.
#[derive(Debug, Clone, Serialize)]
pub struct SellerPublicProfile {
    pub seller_id: SellerId,
    pub shop_name: String,
    pub owner_name: Option<String>,
    pub avatar: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub product_count: i64,
    pub total_sold: i64,
    pub categories: Vec<SellerCategoryCount>,
}

/// Header data for [`SellerPublicProfile`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SellerProfileRow {
    pub seller_id: SellerId,
    pub shop_name: String,
    pub owner_name: Option<String>,
    pub avatar: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub product_count: i64,
    pub total_sold: i64,
}

/// A seller category with the number of active products in it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerCategoryCount {
    pub id: SellerCategoryId,
    pub name: String,
    pub product_count: i64,
}

/// Headline numbers shown on a seller's public page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerPublicStats {
    pub seller_id: SellerId,
    pub product_count: i64,
    pub total_sold: i64,
    pub completed_orders: i64,
    pub customer_count: i64,
    pub joined_at: DateTime<Utc>,
}

/// Body for converting an account into a seller and for renaming a shop.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopNameRequest {
    pub shop_name: String,
}
