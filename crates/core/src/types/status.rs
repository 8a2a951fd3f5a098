//! Role and status enums shared by the server and CLI.
//!
//! Every enum here is stored as a `PostgreSQL` enum type in the `shop`
//! schema and serialized as `snake_case` strings over the API.

use serde::{Deserialize, Serialize};

/// Error returned when a status or role string does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Generates `as_str`, `Display` and case-insensitive `FromStr` for a
/// fieldless enum from a single variant/string table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical string form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError::new($kind, s)),
                }
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys products; the role every registration starts with.
    #[default]
    Customer,
    /// Owns a shop and its products.
    Seller,
    /// Full access to moderation and reporting.
    Admin,
}

string_enum!(Role, "role", {
    Customer => "customer",
    Seller => "seller",
    Admin => "admin",
});

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingConfirmation,
    Processing,
    Shipping,
    Delivered,
    RefundRequested,
    RefundRejected,
    Cancelled,
    Refunded,
    /// Set by the auto-complete job once the refund window has closed.
    Completed,
}

string_enum!(OrderStatus, "order status", {
    PendingConfirmation => "pending_confirmation",
    Processing => "processing",
    Shipping => "shipping",
    Delivered => "delivered",
    RefundRequested => "refund_requested",
    RefundRejected => "refund_rejected",
    Cancelled => "cancelled",
    Refunded => "refunded",
    Completed => "completed",
});

impl OrderStatus {
    /// Rank used when sorting order listings by status.
    #[must_use]
    pub const fn sort_priority(self) -> i32 {
        match self {
            Self::PendingConfirmation => 1,
            Self::Processing => 2,
            Self::Shipping => 3,
            Self::Delivered => 4,
            Self::RefundRequested => 5,
            Self::Cancelled => 6,
            Self::Refunded => 7,
            Self::RefundRejected => 8,
            Self::Completed => 9,
        }
    }

    /// Whether the order's lines count toward seller and platform revenue.
    #[must_use]
    pub const fn is_revenue_countable(self) -> bool {
        matches!(self, Self::Delivered | Self::RefundRejected | Self::Completed)
    }

    /// Whether no further status change is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded | Self::Completed)
    }
}

/// Status of a customer contact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.contact_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    New,
    Responded,
    Closed,
}

string_enum!(ContactStatus, "contact status", {
    New => "new",
    Responded => "responded",
    Closed => "closed",
});

/// Delivery state of an admin notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.notification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Draft,
    Sent,
}

string_enum!(NotificationStatus, "notification status", {
    Draft => "draft",
    Sent => "sent",
});

/// Which accounts receive a notification when it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.notification_audience", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Customers,
    Sellers,
    Admins,
    /// Customers and sellers.
    Both,
    All,
}

string_enum!(Audience, "audience", {
    Customers => "customers",
    Sellers => "sellers",
    Admins => "admins",
    Both => "both",
    All => "all",
});

impl Audience {
    /// Roles targeted by this audience.
    #[must_use]
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Self::Customers => &[Role::Customer],
            Self::Sellers => &[Role::Seller],
            Self::Admins => &[Role::Admin],
            Self::Both => &[Role::Customer, Role::Seller],
            Self::All => &[Role::Customer, Role::Seller, Role::Admin],
        }
    }
}

/// Which of a seller's past buyers receive a seller-authored notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.customer_segment", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    /// Everyone who has ordered one of the seller's products.
    #[default]
    All,
    /// Ordered within the last 30 days.
    Recent,
    /// Three or more distinct orders.
    Frequent,
    /// Total spend at or above the VIP threshold.
    Vip,
}

string_enum!(CustomerSegment, "customer segment", {
    All => "all",
    Recent => "recent",
    Frequent => "frequent",
    Vip => "vip",
});

/// How valuable a buyer is to a seller, by order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    Regular,
    Frequent,
    Vip,
}

impl CustomerTier {
    /// Five or more orders make a VIP, three or more a frequent buyer.
    #[must_use]
    pub const fn from_order_count(orders: i64) -> Self {
        match orders {
            5.. => Self::Vip,
            3..=4 => Self::Frequent,
            _ => Self::Regular,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_strings() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(
            " DELIVERED ".parse::<OrderStatus>().unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: 'shipped'");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::RefundRequested).unwrap();
        assert_eq!(json, "\"refund_requested\"");
    }

    #[test]
    fn test_sort_priority_follows_lifecycle() {
        assert!(
            OrderStatus::PendingConfirmation.sort_priority()
                < OrderStatus::Processing.sort_priority()
        );
        assert!(
            OrderStatus::RefundRequested.sort_priority() < OrderStatus::Cancelled.sort_priority()
        );
        assert!(OrderStatus::Cancelled.sort_priority() < OrderStatus::Refunded.sort_priority());
    }

    #[test]
    fn test_revenue_countable() {
        assert!(OrderStatus::Delivered.is_revenue_countable());
        assert!(OrderStatus::Completed.is_revenue_countable());
        assert!(OrderStatus::RefundRejected.is_revenue_countable());
        assert!(!OrderStatus::Processing.is_revenue_countable());
        assert!(!OrderStatus::Refunded.is_revenue_countable());
    }

    #[test]
    fn test_customer_tier_thresholds() {
        assert_eq!(CustomerTier::from_order_count(0), CustomerTier::Regular);
        assert_eq!(CustomerTier::from_order_count(2), CustomerTier::Regular);
        assert_eq!(CustomerTier::from_order_count(3), CustomerTier::Frequent);
        assert_eq!(CustomerTier::from_order_count(5), CustomerTier::Vip);
    }

    #[test]
    fn test_customer_segment_parses() {
        assert_eq!("VIP".parse::<CustomerSegment>().unwrap(), CustomerSegment::Vip);
        assert_eq!(CustomerSegment::default(), CustomerSegment::All);
        assert!("specific".parse::<CustomerSegment>().is_err());
    }

    #[test]
    fn test_audience_roles() {
        assert_eq!(Audience::Both.roles(), &[Role::Customer, Role::Seller]);
        assert_eq!(Audience::All.roles().len(), 3);
    }
}
