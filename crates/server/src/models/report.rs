//! Admin revenue report types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Time span covered by a revenue report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportInterval {
    /// One month, bucketed per day.
    Monthly,
    /// Ten quarters ending with the requested one, bucketed per quarter.
    Quarterly,
    /// One year, bucketed per month.
    Yearly,
    /// Everything, bucketed per year.
    AllTime,
}

/// Query parameters for the revenue report.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportQuery {
    pub interval: ReportInterval,
    pub year: Option<i32>,
    pub quarter: Option<u32>,
    pub month: Option<u32>,
}

/// `?year=` for the monthly revenue chart.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

/// Revenue and order count for one chart bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueBucket {
    pub label: String,
    pub revenue: Decimal,
    pub orders: i64,
}

/// Revenue report for a period.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub interval: ReportInterval,
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub buckets: Vec<RevenueBucket>,
}

/// Raw `(bucket number, revenue, orders)` aggregate.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct BucketRow {
    pub bucket: i32,
    pub revenue: Decimal,
    pub orders: i64,
}
