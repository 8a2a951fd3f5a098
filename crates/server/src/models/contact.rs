//! Contact message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopx_core::{ContactId, ContactStatus, UserId};

use super::blank_as_none;

/// A message from a user to the admins, with the sender's details.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Contact {
    pub id: ContactId,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

/// Create body.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactCreate {
    pub message: String,
}

/// Status change body.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactStatusUpdate {
    pub status: String,
}

/// Filters for the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}
