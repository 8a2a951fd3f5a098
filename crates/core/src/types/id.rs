//! Typed entity IDs.
//!
//! Every table key is a `SERIAL`, so each ID wraps an `i32`. Separate types
//! keep a `ProductId` from being passed where an `OrderId` is expected.

/// Declare an `i32`-backed ID type.
///
/// The type serializes as a bare number, parses from a decimal string, and
/// (with the `postgres` feature) binds to and decodes from `INTEGER` columns.
///
/// ```rust
/// # use shopx_core::define_id;
/// define_id!(WarehouseId);
///
/// let id: WarehouseId = "12".parse().unwrap();
/// assert_eq!(id.as_i32(), 12);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Entity IDs
define_id!(UserId);
define_id!(SellerId);
define_id!(CategoryId);
define_id!(SellerCategoryId);
define_id!(ProductId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(OrderDetailId);
define_id!(DiscountId);
define_id!(ContactId);
define_id!(NotificationId);
define_id!(UserNotificationId);

impl CategoryId {
    /// The catch-all category that products fall back to when theirs is deleted.
    pub const DEFAULT: Self = Self(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let id = OrderId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: OrderId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display_and_conversions() {
        let id = ProductId::from(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(i32::from(id), 7);
        assert_eq!(id.as_i32(), 7);
    }

    #[test]
    fn test_id_from_str() {
        assert_eq!(" 15 ".parse::<CartItemId>().unwrap(), CartItemId::new(15));
        assert!("abc".parse::<CartItemId>().is_err());
    }

    #[test]
    fn test_default_category() {
        assert_eq!(CategoryId::DEFAULT.as_i32(), 1);
    }
}
