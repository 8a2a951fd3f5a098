//! Platform-wide revenue aggregates for admin reports.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{RepositoryError, revenue_statuses};
use crate::models::report::BucketRow;

/// Calendar field used to bucket orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketField {
    Day,
    Month,
    /// `year * 4 + quarter - 1`, so consecutive quarters have consecutive keys.
    Quarter,
    Year,
}

impl BucketField {
    const fn expression(self) -> &'static str {
        match self {
            Self::Day => "EXTRACT(DAY FROM o.order_date)::int",
            Self::Month => "EXTRACT(MONTH FROM o.order_date)::int",
            Self::Quarter => {
                "(EXTRACT(YEAR FROM o.order_date) * 4 + EXTRACT(QUARTER FROM o.order_date) - 1)::int"
            }
            Self::Year => "EXTRACT(YEAR FROM o.order_date)::int",
        }
    }
}

/// Repository for admin revenue reports.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Sum of `total_payment` and order count per bucket, within `[from, until)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn buckets(
        &self,
        field: BucketField,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<BucketRow>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {bucket} AS bucket,
                   COALESCE(SUM(o.total_payment), 0) AS revenue,
                   COUNT(*) AS orders
            FROM shop.order o
            WHERE o.status IN {statuses}
              AND ($1::timestamptz IS NULL OR o.order_date >= $1)
              AND ($2::timestamptz IS NULL OR o.order_date < $2)
            GROUP BY bucket
            ORDER BY bucket
            ",
            bucket = field.expression(),
            statuses = revenue_statuses!(),
        );
        let rows = sqlx::query_as::<_, BucketRow>(&sql)
            .bind(from)
            .bind(until)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }
}
