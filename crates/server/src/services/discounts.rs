//! Discount code service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{DiscountId, PageRequest, Paged};

use super::{ServiceError, ServiceResult};
use crate::db::RepositoryError;
use crate::db::discounts::{DiscountChanges, DiscountRepository};
use crate::db::orders::OrderRepository;
use crate::models::discount::{
    Discount, DiscountCreate, DiscountFilter, DiscountUpdate, DiscountValidation,
};

const MAX_CODE_LENGTH: usize = 50;

/// Check the terms of a new code. The validity window must not be empty.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` describing the first bad field.
pub fn validate_terms(
    percent: Decimal,
    budget: Decimal,
    max_discount_percent: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ServiceResult<()> {
    check_amounts(percent, budget, max_discount_percent)?;
    if end <= start {
        return Err(ServiceError::InvalidArgument(
            "end_date must be after start_date".to_owned(),
        ));
    }
    Ok(())
}

fn check_amounts(percent: Decimal, budget: Decimal, max_discount_percent: i32) -> ServiceResult<()> {
    if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ServiceError::InvalidArgument(
            "discount_percent must be greater than 0 and at most 100".to_owned(),
        ));
    }
    if budget < Decimal::ZERO {
        return Err(ServiceError::InvalidArgument(
            "budget must not be negative".to_owned(),
        ));
    }
    if !(0..=100).contains(&max_discount_percent) {
        return Err(ServiceError::InvalidArgument(
            "max_discount_percent must be between 0 and 100".to_owned(),
        ));
    }
    Ok(())
}

/// Merge a partial update into the stored code.
///
/// The remaining budget is clamped to the (possibly new) budget, and a code
/// whose end date has passed cannot be left active.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for invalid terms or an attempt to
/// activate an expired code.
pub fn merge_update(
    current: &Discount,
    update: &DiscountUpdate,
    now: DateTime<Utc>,
) -> ServiceResult<DiscountChanges> {
    let changes = DiscountChanges {
        discount_percent: update.discount_percent.unwrap_or(current.discount_percent),
        budget: update.budget.unwrap_or(current.budget),
        max_discount_percent: update
            .max_discount_percent
            .unwrap_or(current.max_discount_percent),
        remaining_budget: update.remaining_budget.unwrap_or(current.remaining_budget),
        start_date: update.start_date.unwrap_or(current.start_date),
        end_date: update.end_date.unwrap_or(current.end_date),
        is_active: update.is_active.unwrap_or(current.is_active),
    };

    check_amounts(
        changes.discount_percent,
        changes.budget,
        changes.max_discount_percent,
    )?;
    // An edited code may start and end on the same instant.
    if changes.end_date < changes.start_date {
        return Err(ServiceError::InvalidArgument(
            "end_date must not be before start_date".to_owned(),
        ));
    }

    if changes.is_active && changes.end_date < now {
        return Err(ServiceError::InvalidArgument(
            "end_date has passed; move it forward to activate this code".to_owned(),
        ));
    }

    Ok(DiscountChanges {
        remaining_budget: changes
            .remaining_budget
            .clamp(Decimal::ZERO, changes.budget),
        ..changes
    })
}

/// Validate a looked-up code for checkout.
#[must_use]
pub fn validation_of(code: &str, discount: Option<Discount>, now: DateTime<Utc>) -> DiscountValidation {
    let Some(discount) = discount else {
        return DiscountValidation {
            is_valid: false,
            message: format!("discount code '{code}' does not exist"),
            discount: None,
        };
    };
    match discount.unusable_reason(now) {
        Some(reason) => DiscountValidation {
            is_valid: false,
            message: reason,
            discount: Some(discount),
        },
        None => DiscountValidation {
            is_valid: true,
            message: "discount code is valid".to_owned(),
            discount: Some(discount),
        },
    }
}

/// Discount operations.
pub struct DiscountService<'a> {
    discounts: DiscountRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> DiscountService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            discounts: DiscountRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for invalid terms and
    /// `ServiceError::Conflict` if the code already exists.
    #[instrument(skip_all, fields(code = %input.code))]
    pub async fn create(&self, input: &DiscountCreate) -> ServiceResult<Discount> {
        let code = input.code.trim();
        if code.is_empty() || code.len() > MAX_CODE_LENGTH {
            return Err(ServiceError::InvalidArgument(format!(
                "code must be 1 to {MAX_CODE_LENGTH} characters"
            )));
        }
        validate_terms(
            input.discount_percent,
            input.budget,
            input.max_discount_percent,
            input.start_date,
            input.end_date,
        )?;

        let discount = self.discounts.create(input).await.map_err(conflict)?;
        tracing::info!(discount_id = %discount.id, "Created discount code");
        Ok(discount)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(
        &self,
        filter: &DiscountFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Discount>> {
        let page = page.normalized();
        let (rows, total) = self
            .discounts
            .list(filter.search.as_deref(), filter.is_active, filter.valid_on_date, page)
            .await?;
        Ok(Paged::new(rows, page, total))
    }

    /// Codes a customer can still use or look forward to.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn available(&self) -> ServiceResult<Vec<Discount>> {
        Ok(self.discounts.list_available(Utc::now()).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the code doesn't exist.
    pub async fn get(&self, id: DiscountId) -> ServiceResult<Discount> {
        self.discounts
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("discount", id))
    }

    /// Look up by code, optionally requiring it to be usable right now.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the code doesn't exist and
    /// `ServiceError::InvalidOperation` if `check_validity` is set and the
    /// code is not currently usable.
    pub async fn get_by_code(&self, code: &str, check_validity: bool) -> ServiceResult<Discount> {
        let discount = self
            .discounts
            .get_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("discount code '{code}' not found")))?;

        if check_validity && let Some(reason) = discount.unusable_reason(Utc::now()) {
            return Err(ServiceError::InvalidOperation(reason));
        }
        Ok(discount)
    }

    /// Report whether a code can be applied at checkout.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn validate(&self, code: &str) -> ServiceResult<DiscountValidation> {
        let discount = self.discounts.get_by_code(code).await?;
        Ok(validation_of(code.trim(), discount, Utc::now()))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the code doesn't exist and
    /// `ServiceError::InvalidArgument` for invalid changes.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: DiscountId, update: &DiscountUpdate) -> ServiceResult<Discount> {
        let current = self.get(id).await?;
        let changes = merge_update(&current, update, Utc::now())?;
        Ok(self.discounts.update(id, &changes).await?)
    }

    /// Turn a code on or off. Unchanged state is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the code doesn't exist and
    /// `ServiceError::InvalidOperation` when activating an expired code.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: DiscountId, is_active: bool) -> ServiceResult<Discount> {
        let current = self.get(id).await?;
        if current.is_active == is_active {
            return Ok(current);
        }
        if is_active && current.end_date < Utc::now() {
            return Err(ServiceError::InvalidOperation(
                "the code has expired; move its end date forward before activating it".to_owned(),
            ));
        }
        Ok(self.discounts.set_active(id, is_active).await?)
    }

    /// Delete a code that no order has used.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the code doesn't exist and
    /// `ServiceError::InvalidOperation` if an order references it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: DiscountId) -> ServiceResult<()> {
        self.get(id).await?;
        if self.orders.uses_discount(id).await? {
            return Err(ServiceError::InvalidOperation(
                "this code has been used by orders; deactivate it instead".to_owned(),
            ));
        }
        self.discounts.delete(id).await?;
        Ok(())
    }

    /// Deactivate codes whose end date has passed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn expire(&self, now: DateTime<Utc>) -> ServiceResult<u64> {
        let expired = self.discounts.deactivate_expired(now).await?;
        if expired > 0 {
            tracing::info!(expired, "Deactivated expired discount codes");
        }
        Ok(expired)
    }
}

fn conflict(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn stored() -> Discount {
        Discount {
            id: DiscountId::new(3),
            code: "WELCOME".to_owned(),
            discount_percent: dec("15"),
            budget: dec("1000"),
            max_discount_percent: 0,
            remaining_budget: dec("800"),
            start_date: at("2026-01-01T00:00:00Z"),
            end_date: at("2026-12-31T00:00:00Z"),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_terms() {
        let start = at("2026-01-01T00:00:00Z");
        let end = at("2026-02-01T00:00:00Z");
        assert!(validate_terms(dec("10"), dec("100"), 0, start, end).is_ok());
        assert!(validate_terms(dec("100"), dec("100"), 50, start, end).is_ok());
        assert!(validate_terms(dec("0"), dec("100"), 0, start, end).is_err());
        assert!(validate_terms(dec("100.5"), dec("100"), 0, start, end).is_err());
        assert!(validate_terms(dec("10"), dec("-1"), 0, start, end).is_err());
        assert!(validate_terms(dec("10"), dec("100"), 101, start, end).is_err());
        assert!(validate_terms(dec("10"), dec("100"), 0, end, start).is_err());
        assert!(validate_terms(dec("10"), dec("100"), 0, start, start).is_err());
    }

    #[test]
    fn test_merge_update_keeps_absent_fields() {
        let now = at("2026-06-01T00:00:00Z");
        let changes = merge_update(&stored(), &DiscountUpdate::default(), now).unwrap();
        assert_eq!(changes.discount_percent, dec("15"));
        assert_eq!(changes.remaining_budget, dec("800"));
        assert!(changes.is_active);
    }

    #[test]
    fn test_merge_update_clamps_remaining_budget() {
        let now = at("2026-06-01T00:00:00Z");
        let update = DiscountUpdate {
            budget: Some(dec("500")),
            ..DiscountUpdate::default()
        };
        let changes = merge_update(&stored(), &update, now).unwrap();
        assert_eq!(changes.budget, dec("500"));
        assert_eq!(changes.remaining_budget, dec("500"));
    }

    #[test]
    fn test_merge_update_refuses_active_past_end() {
        let now = at("2026-06-01T00:00:00Z");
        let update = DiscountUpdate {
            end_date: Some(at("2026-05-01T00:00:00Z")),
            ..DiscountUpdate::default()
        };
        assert!(merge_update(&stored(), &update, now).is_err());

        let update = DiscountUpdate {
            end_date: Some(at("2026-05-01T00:00:00Z")),
            is_active: Some(false),
            ..DiscountUpdate::default()
        };
        assert!(merge_update(&stored(), &update, now).is_ok());
    }

    #[test]
    fn test_merge_update_allows_zero_length_window() {
        let now = at("2026-06-01T00:00:00Z");
        let update = DiscountUpdate {
            start_date: Some(at("2026-12-31T00:00:00Z")),
            ..DiscountUpdate::default()
        };
        let changes = merge_update(&stored(), &update, now).unwrap();
        assert_eq!(changes.start_date, changes.end_date);

        let update = DiscountUpdate {
            end_date: Some(at("2025-12-31T00:00:00Z")),
            is_active: Some(false),
            ..DiscountUpdate::default()
        };
        assert!(merge_update(&stored(), &update, now).is_err());
    }

    #[test]
    fn test_validation_of() {
        let now = at("2026-06-01T00:00:00Z");

        let missing = validation_of("NOPE", None, now);
        assert!(!missing.is_valid);
        assert!(missing.message.contains("does not exist"));

        let valid = validation_of("WELCOME", Some(stored()), now);
        assert!(valid.is_valid);
        assert!(valid.discount.is_some());

        let mut spent = stored();
        spent.remaining_budget = Decimal::ZERO;
        let spent = validation_of("WELCOME", Some(spent), now);
        assert!(!spent.is_valid);
        assert!(spent.message.contains("used up"));
    }
}
