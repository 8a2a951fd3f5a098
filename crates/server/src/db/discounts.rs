//! Discount code repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use shopx_core::{DiscountId, PageRequest};

use super::{RepositoryError, search_term, unique_violation};
use crate::models::discount::{Discount, DiscountCreate};

const DISCOUNT_COLUMNS: &str = r"
    id, code, discount_percent, budget, max_discount_percent, remaining_budget,
    start_date, end_date, is_active
";

/// Resolved field values for a full discount update.
#[derive(Debug, Clone)]
pub struct DiscountChanges {
    pub discount_percent: Decimal,
    pub budget: Decimal,
    pub max_discount_percent: i32,
    pub remaining_budget: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Repository for discount codes.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Admin listing, latest end date first.
    ///
    /// `valid_on` keeps only codes whose window touches that (UTC) day.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        valid_on: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<(Vec<Discount>, i64), RepositoryError> {
        let pattern = search_term(search);
        let filter = r"
            WHERE ($1::text IS NULL OR code ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::date IS NULL OR (start_date::date <= $3 AND end_date::date >= $3))
        ";

        let count_sql = format!("SELECT COUNT(*) FROM shop.discount {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(pattern.as_deref())
            .bind(is_active)
            .bind(valid_on)
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {DISCOUNT_COLUMNS} FROM shop.discount {filter} ORDER BY end_date DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, Discount>(&list_sql)
            .bind(pattern.as_deref())
            .bind(is_active)
            .bind(valid_on)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Active codes that have not ended, soonest start first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self, now: DateTime<Utc>) -> Result<Vec<Discount>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DISCOUNT_COLUMNS} FROM shop.discount
            WHERE is_active AND end_date >= $1 AND remaining_budget > 0
            ORDER BY start_date ASC, id ASC
            "
        );
        let rows = sqlx::query_as::<_, Discount>(&sql)
            .bind(now)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DiscountId) -> Result<Option<Discount>, RepositoryError> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM shop.discount WHERE id = $1");
        let row = sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Case-insensitive lookup by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Discount>, RepositoryError> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM shop.discount WHERE LOWER(code) = LOWER($1)");
        let row = sqlx::query_as::<_, Discount>(&sql)
            .bind(code.trim())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, input: &DiscountCreate) -> Result<Discount, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.discount
                (code, discount_percent, budget, max_discount_percent, remaining_budget,
                 start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, $3, $5, $6, $7)
            RETURNING {DISCOUNT_COLUMNS}
            "
        );
        sqlx::query_as::<_, Discount>(&sql)
            .bind(input.code.trim())
            .bind(input.discount_percent)
            .bind(input.budget)
            .bind(input.max_discount_percent)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await
            .map_err(|e| unique_violation(e, "discount code already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist.
    pub async fn update(
        &self,
        id: DiscountId,
        changes: &DiscountChanges,
    ) -> Result<Discount, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.discount
            SET discount_percent = $2, budget = $3, max_discount_percent = $4,
                remaining_budget = $5, start_date = $6, end_date = $7, is_active = $8
            WHERE id = $1
            RETURNING {DISCOUNT_COLUMNS}
            "
        );
        sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .bind(changes.discount_percent)
            .bind(changes.budget)
            .bind(changes.max_discount_percent)
            .bind(changes.remaining_budget)
            .bind(changes.start_date)
            .bind(changes.end_date)
            .bind(changes.is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist.
    pub async fn set_active(&self, id: DiscountId, is_active: bool) -> Result<Discount, RepositoryError> {
        let sql = format!(
            "UPDATE shop.discount SET is_active = $2 WHERE id = $1 RETURNING {DISCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the code doesn't exist.
    pub async fn delete(&self, id: DiscountId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.discount WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Deactivate active codes whose end date has passed. Returns the count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.discount SET is_active = FALSE WHERE is_active AND end_date < $1")
                .bind(now)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

/// Lock a code for checkout (case-insensitive).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_code(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<Discount>, RepositoryError> {
    let sql = format!(
        "SELECT {DISCOUNT_COLUMNS} FROM shop.discount WHERE LOWER(code) = LOWER($1) FOR UPDATE"
    );
    let row = sqlx::query_as::<_, Discount>(&sql)
        .bind(code.trim())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Subtract a spent amount from the code's remaining budget.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn spend_budget(
    conn: &mut PgConnection,
    id: DiscountId,
    amount: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.discount SET remaining_budget = remaining_budget - $2 WHERE id = $1")
        .bind(id)
        .bind(amount)
        .execute(conn)
        .await?;
    Ok(())
}
