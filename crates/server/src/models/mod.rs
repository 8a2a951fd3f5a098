//! Domain models and API view types.
//!
//! Row types that map 1:1 onto a query derive `sqlx::FromRow`; request
//! bodies derive `Deserialize`; everything returned to clients derives
//! `Serialize`.

pub mod cart;
pub mod catalog;
pub mod contact;
pub mod discount;
pub mod notification;
pub mod order;
pub mod report;
pub mod seller;
pub mod stats;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, mapping blank values to `None`.
///
/// Query strings such as `?search=&status=` arrive as empty strings.
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }))
}
