//! Notification types: admin broadcasts, seller announcements and per-user
//! inbox entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::{
    Audience, CustomerSegment, CustomerTier, NotificationId, NotificationStatus, Role, SellerId,
    UserId, UserNotificationId,
};

use super::blank_as_none;

/// A broadcast authored by an admin, or by a seller for their own buyers.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub content: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub target_audience: Audience,
    pub status: NotificationStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub total_sent: i32,
    pub total_read: i32,
    /// Set on seller-authored notifications, together with the segment.
    pub seller_id: Option<SellerId>,
    pub customer_segment: Option<CustomerSegment>,
}

/// Create/update body.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationInput {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub target_audience: Audience,
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_kind() -> String {
    "info".to_owned()
}

fn default_icon() -> String {
    "bell".to_owned()
}

/// Create/update body for a seller's notification.
#[derive(Debug, Clone, Deserialize)]
pub struct SellerNotificationInput {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default = "default_seller_kind")]
    pub kind: String,
    #[serde(default = "default_seller_icon")]
    pub icon: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    #[serde(default)]
    pub target_customers: CustomerSegment,
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_seller_kind() -> String {
    "promotion".to_owned()
}

fn default_seller_icon() -> String {
    "store".to_owned()
}

impl SellerNotificationInput {
    /// The broadcast fields. Seller notifications always go to customers.
    #[must_use]
    pub fn to_broadcast(&self) -> NotificationInput {
        NotificationInput {
            title: self.title.clone(),
            content: self.content.clone(),
            kind: self.kind.clone(),
            icon: self.icon.clone(),
            action_text: self.action_text.clone(),
            action_url: self.action_url.clone(),
            target_audience: Audience::Customers,
            scheduled_at: self.scheduled_at,
        }
    }
}

/// `?type=&search=` on a seller's own notification list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellerNotificationFilter {
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}

/// A buyer's order history with one seller.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerActivity {
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
}

/// A seller's buyer, ranked into a tier.
#[derive(Debug, Clone, Serialize)]
pub struct SellerCustomer {
    #[serde(flatten)]
    pub activity: CustomerActivity,
    pub tier: CustomerTier,
}

impl From<CustomerActivity> for SellerCustomer {
    fn from(activity: CustomerActivity) -> Self {
        Self {
            tier: CustomerTier::from_order_count(activity.total_orders),
            activity,
        }
    }
}

/// One delivery of a seller's notification, with the buyer's history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecipientRow {
    pub id: UserNotificationId,
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_read: bool,
    pub received_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
}

/// A recipient of a seller's notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecipient {
    #[serde(flatten)]
    pub delivery: RecipientRow,
    pub tier: CustomerTier,
}

impl From<RecipientRow> for NotificationRecipient {
    fn from(delivery: RecipientRow) -> Self {
        Self {
            tier: CustomerTier::from_order_count(delivery.total_orders),
            delivery,
        }
    }
}

/// Filters for the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}

/// `?audience=` for the recipient count endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AudienceQuery {
    pub audience: Audience,
}

/// How many accounts a given audience currently reaches.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecipientCount {
    pub audience: Audience,
    pub count: i64,
}

/// Delivery/read numbers for one notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationStats {
    pub notification_id: NotificationId,
    pub total_sent: i64,
    pub total_read: i64,
    pub read_rate: Decimal,
    pub by_user_type: Vec<UserTypeStats>,
}

/// Delivery/read numbers for one recipient role.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserTypeStats {
    pub user_type: Role,
    pub sent: i64,
    pub read: i64,
}

/// A notification in a user's inbox.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InboxItem {
    pub id: UserNotificationId,
    pub notification_id: NotificationId,
    pub title: String,
    pub content: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
}

/// `?unread_only=true` on the inbox listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Body of the unread count endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}
