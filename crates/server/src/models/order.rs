//! Order types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::{
    CartItemId, CategoryId, DiscountId, OrderDetailId, OrderId, OrderStatus, ProductId, SellerId,
    UserId,
};

use super::blank_as_none;

/// An order row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub discount_id: Option<DiscountId>,
    pub discount_code: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub total_payment: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
}

/// Full order with its lines, as returned by detail and checkout endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub total_payment: Decimal,
    pub discount_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub discount_code: Option<String>,
    pub can_request_refund: bool,
    pub days_left_for_refund: i64,
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderLine>,
}

/// Buyer details shown to sellers and admins.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderCustomer {
    pub user_id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// One order line with a snapshot price and the product's current state.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderDetailId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub category_name: String,
    pub seller_id: SellerId,
    pub shop_name: String,
    pub shop_is_active: bool,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub current_price: Decimal,
    pub current_stock: i32,
    pub product_is_active: bool,
}

/// Compact order entry for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub total_payment: Decimal,
    pub status: OrderStatus,
    pub item_count: i64,
    pub customer_name: Option<String>,
    pub customer_email: String,
    #[sqlx(skip)]
    pub can_request_refund: bool,
    #[sqlx(skip)]
    pub days_left_for_refund: i64,
}

/// Checkout body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub cart_item_ids: Vec<CartItemId>,
    pub shipping_address: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub discount_code: Option<String>,
}

/// Status change body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

/// Filters shared by the customer, seller and admin order listings.
///
/// `search`, `min_amount`, `max_amount` and the total/customer/status sorts
/// are only honoured by the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort: Option<String>,
}

/// Sort orders accepted by order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    NewestFirst,
    OldestFirst,
    TotalAsc,
    TotalDesc,
    CustomerAsc,
    CustomerDesc,
    StatusAsc,
    StatusDesc,
}

impl OrderSort {
    /// Parse a `sort` query value for customer and seller listings.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("orderdate_asc") => Self::OldestFirst,
            _ => Self::NewestFirst,
        }
    }

    /// Parse a `sort` query value for the admin listing.
    #[must_use]
    pub fn from_admin_param(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("orderdate_asc") => Self::OldestFirst,
            Some("totalamount" | "totalamount_asc") => Self::TotalAsc,
            Some("totalamount_desc") => Self::TotalDesc,
            Some("customername" | "customername_asc") => Self::CustomerAsc,
            Some("customername_desc") => Self::CustomerDesc,
            Some("status" | "status_asc") => Self::StatusAsc,
            Some("status_desc") => Self::StatusDesc,
            _ => Self::NewestFirst,
        }
    }

    /// `ORDER BY` clause over the order listing query.
    ///
    /// Status sorts use the lifecycle priority rather than the enum's
    /// declaration order.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::NewestFirst => "o.order_date DESC, o.id DESC",
            Self::OldestFirst => "o.order_date ASC, o.id ASC",
            Self::TotalAsc => "o.total_amount ASC, o.id ASC",
            Self::TotalDesc => "o.total_amount DESC, o.id DESC",
            Self::CustomerAsc => "u.full_name ASC NULLS LAST, o.id ASC",
            Self::CustomerDesc => "u.full_name DESC NULLS LAST, o.id DESC",
            Self::StatusAsc => concat!(
                "CASE o.status WHEN 'pending_confirmation' THEN 1 WHEN 'processing' THEN 2 ",
                "WHEN 'shipping' THEN 3 WHEN 'delivered' THEN 4 WHEN 'refund_requested' THEN 5 ",
                "WHEN 'cancelled' THEN 6 WHEN 'refunded' THEN 7 WHEN 'refund_rejected' THEN 8 ",
                "ELSE 9 END ASC, o.order_date DESC"
            ),
            Self::StatusDesc => concat!(
                "CASE o.status WHEN 'pending_confirmation' THEN 1 WHEN 'processing' THEN 2 ",
                "WHEN 'shipping' THEN 3 WHEN 'delivered' THEN 4 WHEN 'refund_requested' THEN 5 ",
                "WHEN 'cancelled' THEN 6 WHEN 'refunded' THEN 7 WHEN 'refund_rejected' THEN 8 ",
                "ELSE 9 END DESC, o.order_date DESC"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_sort_only_knows_dates() {
        assert_eq!(OrderSort::from_param(Some("orderdate_asc")), OrderSort::OldestFirst);
        assert_eq!(OrderSort::from_param(Some("totalamount")), OrderSort::NewestFirst);
        assert_eq!(OrderSort::from_param(None), OrderSort::NewestFirst);
    }

    #[test]
    fn test_admin_sort() {
        assert_eq!(
            OrderSort::from_admin_param(Some("TotalAmount_Desc")),
            OrderSort::TotalDesc
        );
        assert_eq!(
            OrderSort::from_admin_param(Some("customername")),
            OrderSort::CustomerAsc
        );
        assert_eq!(OrderSort::from_admin_param(Some("status_desc")), OrderSort::StatusDesc);
    }

    #[test]
    fn test_admin_sort_accepts_explicit_ascending() {
        assert_eq!(OrderSort::from_admin_param(Some("totalamount_asc")), OrderSort::TotalAsc);
        assert_eq!(
            OrderSort::from_admin_param(Some("CustomerName_Asc")),
            OrderSort::CustomerAsc
        );
        assert_eq!(OrderSort::from_admin_param(Some("status_asc")), OrderSort::StatusAsc);
        assert_eq!(OrderSort::from_admin_param(Some("bogus")), OrderSort::NewestFirst);
    }

    #[test]
    fn test_status_sort_lists_every_priority() {
        for status in OrderStatus::ALL {
            if *status == OrderStatus::Completed {
                continue;
            }
            let needle = format!("'{}' THEN {}", status.as_str(), status.sort_priority());
            assert!(OrderSort::StatusAsc.order_by().contains(&needle), "{needle}");
        }
    }
}
