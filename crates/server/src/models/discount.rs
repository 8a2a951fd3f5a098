//! Discount code types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::DiscountId;
use shopx_core::pricing::DiscountTerms;

use super::blank_as_none;

/// A promotional code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Discount {
    pub id: DiscountId,
    pub code: String,
    pub discount_percent: Decimal,
    pub budget: Decimal,
    pub max_discount_percent: i32,
    pub remaining_budget: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl Discount {
    /// The terms that decide how much this code takes off an order.
    #[must_use]
    pub const fn terms(&self) -> DiscountTerms {
        DiscountTerms {
            percent: self.discount_percent,
            max_discount_percent: self.max_discount_percent,
        }
    }

    /// First reason this code cannot be used at `now`, if any.
    ///
    /// Checks run in a fixed order: active flag, start date, end date, budget.
    #[must_use]
    pub fn unusable_reason(&self, now: DateTime<Utc>) -> Option<String> {
        if !self.is_active {
            return Some(format!("discount code '{}' is not active", self.code));
        }
        if now < self.start_date {
            return Some(format!("discount code '{}' is not valid yet", self.code));
        }
        if now > self.end_date {
            return Some(format!("discount code '{}' has expired", self.code));
        }
        if self.remaining_budget <= Decimal::ZERO {
            return Some(format!("discount code '{}' has been used up", self.code));
        }
        None
    }
}

/// Create body.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCreate {
    pub code: String,
    pub discount_percent: Decimal,
    pub budget: Decimal,
    #[serde(default)]
    pub max_discount_percent: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Partial update body; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountUpdate {
    pub discount_percent: Option<Decimal>,
    pub budget: Option<Decimal>,
    pub max_discount_percent: Option<i32>,
    pub remaining_budget: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Body of the toggle-active endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DiscountActivation {
    pub is_active: bool,
}

/// Filters for the admin discount listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    pub is_active: Option<bool>,
    /// Only codes whose window covers this day.
    pub valid_on_date: Option<NaiveDate>,
}

/// `?check_validity=true` on lookup by code.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CodeLookupQuery {
    #[serde(default)]
    pub check_validity: bool,
}

/// Result of validating a code before checkout.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountValidation {
    pub is_valid: bool,
    pub message: String,
    pub discount: Option<Discount>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn discount() -> Discount {
        Discount {
            id: DiscountId::new(1),
            code: "SPRING10".to_owned(),
            discount_percent: Decimal::from(10),
            budget: Decimal::from(500),
            max_discount_percent: 0,
            remaining_budget: Decimal::from(120),
            start_date: "2026-03-01T00:00:00Z".parse().unwrap(),
            end_date: "2026-03-31T23:59:59Z".parse().unwrap(),
            is_active: true,
        }
    }

    #[test]
    fn test_usable_inside_window() {
        let now = "2026-03-15T10:00:00Z".parse().unwrap();
        assert_eq!(discount().unusable_reason(now), None);
    }

    #[test]
    fn test_unusable_reasons_in_order() {
        let now: DateTime<Utc> = "2026-03-15T10:00:00Z".parse().unwrap();

        let mut inactive = discount();
        inactive.is_active = false;
        inactive.remaining_budget = Decimal::ZERO;
        assert!(inactive.unusable_reason(now).unwrap().contains("not active"));

        let early = "2026-02-01T00:00:00Z".parse().unwrap();
        assert!(discount().unusable_reason(early).unwrap().contains("not valid yet"));

        let late = "2026-04-01T00:00:00Z".parse().unwrap();
        assert!(discount().unusable_reason(late).unwrap().contains("expired"));

        let mut exhausted = discount();
        exhausted.remaining_budget = Decimal::ZERO;
        assert!(exhausted.unusable_reason(now).unwrap().contains("used up"));
    }
}
