//! Catalog types: platform categories, seller categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::{CategoryId, ProductId, SellerCategoryId, SellerId};

use super::blank_as_none;

/// Platform-wide product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Create/update body for a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// A seller's own grouping of their products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerCategory {
    pub id: SellerCategoryId,
    pub seller_id: SellerId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub product_count: i64,
}

/// Create/update body for a seller category.
#[derive(Debug, Clone, Deserialize)]
pub struct SellerCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Product as shown to clients, joined with its category and seller.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub category_id: CategoryId,
    pub category_name: String,
    pub seller_id: SellerId,
    pub shop_name: String,
    pub seller_category_id: Option<SellerCategoryId>,
    pub seller_category_name: Option<String>,
    pub sold_quantity: i64,
}

/// Create/update body for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub seller_category_id: Option<SellerCategoryId>,
    pub is_active: Option<bool>,
}

/// Sort orders accepted by product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    BestSelling,
}

impl ProductSort {
    /// Parse a `sort` query value; unknown or missing values sort newest first.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match value.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "oldest" => Self::Oldest,
            "priceasc" => Self::PriceAsc,
            "pricedesc" => Self::PriceDesc,
            "name" | "nameasc" => Self::NameAsc,
            "bestseller" | "bestselling" => Self::BestSelling,
            _ => Self::Newest,
        }
    }

    /// `ORDER BY` clause over the product listing query.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::Oldest => "p.created_at ASC, p.id ASC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::NameAsc => "p.name ASC, p.id ASC",
            Self::BestSelling => "sold_quantity DESC, p.id DESC",
        }
    }
}

/// Query parameters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub seller_id: Option<SellerId>,
    pub seller_category_id: Option<SellerCategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort: Option<String>,
}

/// Query parameters for the seller's own product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellerProductFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    pub seller_category_id: Option<SellerCategoryId>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort: Option<String>,
}

/// `?hard=true` on product delete.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeleteProductQuery {
    #[serde(default)]
    pub hard: bool,
}

/// `?limit=` for short product strips (best sellers, newest).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    8
}

impl LimitQuery {
    /// Limit clamped to `1..=50`.
    #[must_use]
    pub fn clamped(self) -> i64 {
        self.limit.clamp(1, 50)
    }
}

/// `?sort=` on its own, for listings with a fixed filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort: Option<String>,
}

/// Search box query for simple listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_sort_accepts_both_spellings() {
        assert_eq!(ProductSort::from_param(Some("priceasc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::from_param(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_param(Some("NameAsc")), ProductSort::NameAsc);
        assert_eq!(ProductSort::from_param(Some("name")), ProductSort::NameAsc);
        assert_eq!(ProductSort::from_param(Some("bestseller")), ProductSort::BestSelling);
        assert_eq!(ProductSort::from_param(Some("oldest")), ProductSort::Oldest);
    }

    #[test]
    fn test_product_sort_defaults_to_newest() {
        assert_eq!(ProductSort::from_param(None), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(Some("random")), ProductSort::Newest);
    }

    #[test]
    fn test_limit_query_clamps() {
        assert_eq!(LimitQuery { limit: 0 }.clamped(), 1);
        assert_eq!(LimitQuery { limit: 500 }.clamped(), 50);
        assert_eq!(LimitQuery { limit: 12 }.clamped(), 12);
    }
}
