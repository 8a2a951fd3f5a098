//! Admin revenue reports over revenue-countable orders.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use super::{ServiceError, ServiceResult};
use crate::db::reports::{BucketField, ReportRepository};
use crate::models::report::{BucketRow, ReportInterval, ReportQuery, RevenueBucket, RevenueReport};

/// What to query and how to label it, for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPlan {
    pub field: BucketField,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// `(bucket number, label)` in display order. Empty means "whatever the
    /// data contains" (all-time).
    pub slots: Vec<(i32, String)>,
}

fn month_start(year: i32, month: u32) -> ServiceResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ServiceError::InvalidArgument(format!("invalid month {year}-{month}")))
}

fn instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn after_months(date: NaiveDate, months: u32) -> ServiceResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ServiceError::InvalidArgument("date out of range".to_owned()))
}

/// Number of quarters in a quarterly report, ending with the requested one.
const QUARTERS_SHOWN: i32 = 10;

fn quarter_key(year: i32, quarter: u32) -> i32 {
    year * 4 + i32::try_from(quarter).unwrap_or_default() - 1
}

const fn quarter_of_key(key: i32) -> (i32, u32) {
    (key.div_euclid(4), key.rem_euclid(4).unsigned_abs() + 1)
}

fn month_slots(year: i32, months: std::ops::RangeInclusive<u32>) -> Vec<(i32, String)> {
    months
        .map(|m| (i32::try_from(m).unwrap_or_default(), format!("{year}-{m:02}")))
        .collect()
}

/// Work out the period, bucket field and labels for a report request.
///
/// Missing year/quarter/month default to the ones containing `now`.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for an out-of-range month or quarter.
pub fn plan(query: &ReportQuery, now: DateTime<Utc>) -> ServiceResult<ReportPlan> {
    let year = query.year.unwrap_or_else(|| now.year());
    match query.interval {
        ReportInterval::Monthly => {
            let month = query.month.unwrap_or_else(|| now.month());
            if !(1..=12).contains(&month) {
                return Err(ServiceError::InvalidArgument(
                    "month must be between 1 and 12".to_owned(),
                ));
            }
            let start = month_start(year, month)?;
            let end = after_months(start, 1)?;
            let days = (end - start).num_days();
            let slots = (1..=days)
                .map(|d| {
                    let d = i32::try_from(d).unwrap_or_default();
                    (d, format!("{year}-{month:02}-{d:02}"))
                })
                .collect();
            Ok(ReportPlan {
                field: BucketField::Day,
                from: Some(instant(start)),
                until: Some(instant(end)),
                slots,
            })
        }
        ReportInterval::Quarterly => {
            let quarter = query.quarter.unwrap_or_else(|| now.month0() / 3 + 1);
            if !(1..=4).contains(&quarter) {
                return Err(ServiceError::InvalidArgument(
                    "quarter must be between 1 and 4".to_owned(),
                ));
            }
            let last = quarter_key(year, quarter);
            let first = last - (QUARTERS_SHOWN - 1);
            let (first_year, first_quarter) = quarter_of_key(first);
            let start = month_start(first_year, (first_quarter - 1) * 3 + 1)?;
            let slots = (first..=last)
                .map(|key| {
                    let (y, q) = quarter_of_key(key);
                    (key, format!("Q{q}/{y}"))
                })
                .collect();
            Ok(ReportPlan {
                field: BucketField::Quarter,
                from: Some(instant(start)),
                until: Some(instant(after_months(start, 3 * QUARTERS_SHOWN.unsigned_abs())?)),
                slots,
            })
        }
        ReportInterval::Yearly => {
            let start = month_start(year, 1)?;
            Ok(ReportPlan {
                field: BucketField::Month,
                from: Some(instant(start)),
                until: Some(instant(after_months(start, 12)?)),
                slots: month_slots(year, 1..=12),
            })
        }
        ReportInterval::AllTime => Ok(ReportPlan {
            field: BucketField::Year,
            from: None,
            until: None,
            slots: Vec::new(),
        }),
    }
}

/// Lay aggregate rows onto the planned slots, zero-filling gaps.
///
/// With no planned slots, every year from the first to the last row is shown.
#[must_use]
pub fn build_report(interval: ReportInterval, slots: &[(i32, String)], rows: &[BucketRow]) -> RevenueReport {
    let generated;
    let slots = if slots.is_empty() {
        generated = match (rows.iter().map(|r| r.bucket).min(), rows.iter().map(|r| r.bucket).max()) {
            (Some(first), Some(last)) => (first..=last).map(|y| (y, y.to_string())).collect(),
            _ => Vec::new(),
        };
        &generated
    } else {
        slots
    };

    let buckets: Vec<RevenueBucket> = slots
        .iter()
        .map(|(key, label)| {
            let row = rows.iter().find(|r| r.bucket == *key);
            RevenueBucket {
                label: label.clone(),
                revenue: row.map_or(Decimal::ZERO, |r| r.revenue),
                orders: row.map_or(0, |r| r.orders),
            }
        })
        .collect();

    RevenueReport {
        interval,
        total_revenue: buckets.iter().map(|b| b.revenue).sum(),
        total_orders: buckets.iter().map(|b| b.orders).sum(),
        buckets,
    }
}

pub struct ReportService<'a> {
    reports: ReportRepository<'a>,
}

impl<'a> ReportService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reports: ReportRepository::new(pool),
        }
    }

    /// Twelve monthly buckets for one year.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn monthly_revenue(&self, year: i32) -> ServiceResult<RevenueReport> {
        let query = ReportQuery {
            interval: ReportInterval::Yearly,
            year: Some(year),
            quarter: None,
            month: None,
        };
        self.revenue(&query, Utc::now()).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an out-of-range month or quarter.
    #[instrument(skip(self, now), fields(interval = ?query.interval))]
    pub async fn revenue(&self, query: &ReportQuery, now: DateTime<Utc>) -> ServiceResult<RevenueReport> {
        let plan = plan(query, now)?;
        let rows = self.reports.buckets(plan.field, plan.from, plan.until).await?;
        Ok(build_report(query.interval, &plan.slots, &rows))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(interval: ReportInterval, year: Option<i32>, quarter: Option<u32>, month: Option<u32>) -> ReportQuery {
        ReportQuery {
            interval,
            year,
            quarter,
            month,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 14, 12, 0, 0).unwrap()
    }

    fn row(bucket: i32, revenue: &str, orders: i64) -> BucketRow {
        BucketRow {
            bucket,
            revenue: revenue.parse().unwrap(),
            orders,
        }
    }

    #[test]
    fn test_monthly_plan_covers_each_day() {
        let p = plan(&query(ReportInterval::Monthly, Some(2028), None, Some(2)), now()).unwrap();
        assert_eq!(p.field, BucketField::Day);
        assert_eq!(p.slots.len(), 29);
        assert_eq!(p.slots[0].1, "2028-02-01");
        assert_eq!(p.from, Some(Utc.with_ymd_and_hms(2028, 2, 1, 0, 0, 0).unwrap()));
        assert_eq!(p.until, Some(Utc.with_ymd_and_hms(2028, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_quarterly_defaults_to_current_quarter() {
        let p = plan(&query(ReportInterval::Quarterly, None, None, None), now()).unwrap();
        assert_eq!(p.field, BucketField::Quarter);
        assert_eq!(p.slots.len(), 10);
        assert_eq!(p.slots[0].1, "Q4/2024");
        assert_eq!(p.slots[9].1, "Q3/2026");
        assert_eq!(p.from, Some(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()));
        assert_eq!(p.until, Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_quarterly_spans_ten_quarters_oldest_first() {
        let p = plan(&query(ReportInterval::Quarterly, Some(2026), Some(1), None), now()).unwrap();
        let labels: Vec<&str> = p.slots.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Q4/2023", "Q1/2024", "Q2/2024", "Q3/2024", "Q4/2024", "Q1/2025", "Q2/2025",
                "Q3/2025", "Q4/2025", "Q1/2026"
            ]
        );
        assert_eq!(p.until, Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_fourth_quarter_ends_next_year() {
        let p = plan(&query(ReportInterval::Quarterly, Some(2026), Some(4), None), now()).unwrap();
        assert_eq!(p.until, Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_quarterly_report_zero_fills_empty_quarters() {
        let p = plan(&query(ReportInterval::Quarterly, Some(2026), Some(2), None), now()).unwrap();
        let report = build_report(
            ReportInterval::Quarterly,
            &p.slots,
            &[row(quarter_key(2026, 2), "300", 3), row(quarter_key(2025, 4), "50", 1)],
        );
        assert_eq!(report.buckets.len(), 10);
        assert_eq!(report.buckets[9].label, "Q2/2026");
        assert_eq!(report.buckets[9].orders, 3);
        assert_eq!(report.buckets[7].label, "Q4/2025");
        assert_eq!(report.buckets[7].revenue, "50".parse::<Decimal>().unwrap());
        assert_eq!(report.buckets[0].revenue, Decimal::ZERO);
        assert_eq!(report.total_orders, 4);
    }

    #[test]
    fn test_plan_rejects_bad_ranges() {
        assert!(plan(&query(ReportInterval::Monthly, None, None, Some(13)), now()).is_err());
        assert!(plan(&query(ReportInterval::Quarterly, None, Some(5), None), now()).is_err());
    }

    #[test]
    fn test_build_report_zero_fills() {
        let slots = month_slots(2026, 1..=12);
        let report = build_report(
            ReportInterval::Yearly,
            &slots,
            &[row(3, "100.50", 2), row(11, "20", 1)],
        );
        assert_eq!(report.buckets.len(), 12);
        assert_eq!(report.buckets[0].revenue, Decimal::ZERO);
        assert_eq!(report.buckets[2].orders, 2);
        assert_eq!(report.buckets[10].label, "2026-11");
        assert_eq!(report.total_revenue, "120.50".parse::<Decimal>().unwrap());
        assert_eq!(report.total_orders, 3);
    }

    #[test]
    fn test_build_report_all_time_spans_years() {
        let report = build_report(
            ReportInterval::AllTime,
            &[],
            &[row(2023, "10", 1), row(2026, "5", 1)],
        );
        let labels: Vec<&str> = report.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2023", "2024", "2025", "2026"]);
        assert_eq!(report.buckets[1].revenue, Decimal::ZERO);

        let empty = build_report(ReportInterval::AllTime, &[], &[]);
        assert!(empty.buckets.is_empty());
        assert_eq!(empty.total_orders, 0);
    }
}
