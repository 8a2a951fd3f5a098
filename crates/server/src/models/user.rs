//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shopx_core::{Email, Role, SellerId, UserId};

use super::blank_as_none;

/// An account (domain type).
///
/// `seller_id` and `shop_name` are present when the user owns an active
/// seller profile.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<bool>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub social_provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub seller_id: Option<SellerId>,
    pub shop_name: Option<String>,
}

/// Fields needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub social_provider: Option<String>,
    pub social_id: Option<String>,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<bool>,
    pub address: Option<String>,
    pub avatar: Option<String>,
}

/// Admin edit of an account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(flatten)]
    pub profile: ProfileUpdate,
    pub is_active: Option<bool>,
}

/// Admin creation of an account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserCreate {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Required when `role` is seller.
    pub shop_name: Option<String>,
}

/// Body of the set-role endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
    pub shop_name: Option<String>,
}

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Compact user entry for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub shop_name: Option<String>,
}

/// Registration body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity asserted by an external provider after its own sign-in flow.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialLoginRequest {
    pub provider: String,
    pub social_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

/// Change-password body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Issued token plus the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// The authenticated account behind a request, as carried in its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub seller_id: Option<SellerId>,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The seller profile, when acting as a seller.
    #[must_use]
    pub fn seller(&self) -> Option<SellerId> {
        if self.role == Role::Seller { self.seller_id } else { None }
    }
}
