//! Sales analytics over daily figures.
//!
//! Money stays in `Decimal`; the trend statistics (slope, coefficient of
//! variation) are computed in `f64` since they are descriptive only.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::pricing::{growth_percent, round_money};

/// Slope (currency per day) beyond which revenue counts as moving.
const TREND_THRESHOLD: f64 = 0.1;

/// Coefficient of variation (%) under which revenue counts as steady.
const STEADY_VOLATILITY: f64 = 20.0;

/// One day of a seller's sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
    pub products_sold: i64,
    pub unique_customers: i64,
}

impl DailySales {
    /// A day without sales.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            revenue: Decimal::ZERO,
            orders: 0,
            products_sold: 0,
            unique_customers: 0,
        }
    }

    #[must_use]
    pub fn average_order_value(&self) -> Decimal {
        if self.orders > 0 {
            round_money(self.revenue / Decimal::from(self.orders))
        } else {
            Decimal::ZERO
        }
    }

    #[must_use]
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.date.weekday())
    }
}

#[must_use]
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Lay sparse daily rows onto `days` consecutive dates starting at `start`.
#[must_use]
pub fn fill_days(start: NaiveDate, days: u32, rows: &[DailySales]) -> Vec<DailySales> {
    start
        .iter_days()
        .take(days as usize)
        .map(|date| {
            rows.iter()
                .find(|r| r.date == date)
                .cloned()
                .unwrap_or_else(|| DailySales::empty(date))
        })
        .collect()
}

/// Totals and averages over a run of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodMetrics {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_products_sold: i64,
    /// Sum of each day's distinct buyers.
    pub total_unique_customers: i64,
    /// Mean of the daily order values, over days with sales.
    pub average_order_value: Decimal,
    pub average_daily_revenue: Decimal,
    pub days_with_sales: usize,
    pub total_days: usize,
    pub peak_day: Option<NaiveDate>,
    pub lowest_day: Option<NaiveDate>,
}

impl PeriodMetrics {
    #[must_use]
    pub fn from_days(days: &[DailySales]) -> Self {
        let selling: Vec<&DailySales> = days.iter().filter(|d| d.revenue > Decimal::ZERO).collect();
        let total_revenue: Decimal = days.iter().map(|d| d.revenue).sum();

        let average_order_value = if selling.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = selling.iter().map(|d| d.average_order_value()).sum();
            round_money(sum / Decimal::from(selling.len()))
        };
        let average_daily_revenue = if days.is_empty() {
            Decimal::ZERO
        } else {
            round_money(total_revenue / Decimal::from(days.len()))
        };

        // Earliest day wins ties in both directions.
        let peak_day = days
            .iter()
            .rev()
            .max_by(|a, b| a.revenue.cmp(&b.revenue))
            .map(|d| d.date);
        let lowest_day = days
            .iter()
            .min_by(|a, b| a.revenue.cmp(&b.revenue))
            .map(|d| d.date);

        Self {
            total_revenue,
            total_orders: days.iter().map(|d| d.orders).sum(),
            total_products_sold: days.iter().map(|d| d.products_sold).sum(),
            total_unique_customers: days.iter().map(|d| d.unique_customers).sum(),
            average_order_value,
            average_daily_revenue,
            days_with_sales: selling.len(),
            total_days: days.len(),
            peak_day,
            lowest_day,
        }
    }
}

/// Percentage change of each period metric against the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrowthMetrics {
    pub revenue: Decimal,
    pub orders: Decimal,
    pub products_sold: Decimal,
    pub customers: Decimal,
    pub average_order_value: Decimal,
    pub average_daily_revenue: Decimal,
}

impl GrowthMetrics {
    #[must_use]
    pub fn between(current: &PeriodMetrics, previous: &PeriodMetrics) -> Self {
        let count = |c: i64, p: i64| growth_percent(Decimal::from(c), Decimal::from(p));
        Self {
            revenue: growth_percent(current.total_revenue, previous.total_revenue),
            orders: count(current.total_orders, previous.total_orders),
            products_sold: count(current.total_products_sold, previous.total_products_sold),
            customers: count(current.total_unique_customers, previous.total_unique_customers),
            average_order_value: growth_percent(
                current.average_order_value,
                previous.average_order_value,
            ),
            average_daily_revenue: growth_percent(
                current.average_daily_revenue,
                previous.average_daily_revenue,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Shape of a daily revenue series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Absolute least-squares slope, in currency per day.
    pub strength: f64,
    /// The last three days rose strictly.
    pub is_accelerating: bool,
    /// Coefficient of variation, in percent.
    pub volatility: f64,
    pub recommendation: &'static str,
}

impl TrendAnalysis {
    /// Fewer than three days is always stable.
    #[must_use]
    pub fn of(days: &[DailySales]) -> Self {
        if days.len() < 3 {
            return Self {
                direction: TrendDirection::Stable,
                strength: 0.0,
                is_accelerating: false,
                volatility: 0.0,
                recommendation: recommendation(0.0, false),
            };
        }
        let values: Vec<f64> = days
            .iter()
            .map(|d| d.revenue.to_f64().unwrap_or_default())
            .collect();
        let slope = linear_slope(&values);
        let is_accelerating = matches!(
            days,
            [.., a, b, c] if c.revenue > b.revenue && b.revenue > a.revenue
        );
        let direction = if slope > TREND_THRESHOLD {
            TrendDirection::Increasing
        } else if slope < -TREND_THRESHOLD {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        Self {
            direction,
            strength: slope.abs(),
            is_accelerating,
            volatility: volatility(&values),
            recommendation: recommendation(slope, is_accelerating),
        }
    }

    #[must_use]
    pub fn is_steady(&self) -> bool {
        self.volatility < STEADY_VOLATILITY
    }
}

fn recommendation(slope: f64, is_accelerating: bool) -> &'static str {
    if slope > 2.0 * TREND_THRESHOLD {
        if is_accelerating {
            "Revenue is rising and accelerating; consider stepping up marketing."
        } else {
            "Revenue is rising; keep the current strategy."
        }
    } else if slope < -2.0 * TREND_THRESHOLD {
        "Revenue is falling; review pricing and promotion."
    } else {
        "Revenue is flat; new campaigns could help it grow."
    }
}

fn count_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Least-squares slope of `values` against their index.
#[must_use]
pub fn linear_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = count_f64(values.len());
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (x, y) in (0u32..).map(f64::from).zip(values) {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }
    let denominator = n.mul_add(sum_x2, -(sum_x * sum_x));
    if denominator == 0.0 {
        return 0.0;
    }
    n.mul_add(sum_xy, -(sum_x * sum_y)) / denominator
}

/// Population standard deviation over the mean, in percent. Zero when the
/// mean is zero.
#[must_use]
pub fn volatility(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = count_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean * 100.0
}

/// Estimated cost of goods as a percent of revenue, by average unit price.
///
/// Premium items (above one million) carry a thinner cost share, budget
/// items (under one hundred thousand) a thicker one.
#[must_use]
pub fn cogs_percent(average_price: Decimal) -> Decimal {
    let base = Decimal::from(55);
    if average_price > Decimal::from(1_000_000) {
        base - Decimal::from(5)
    } else if average_price < Decimal::from(100_000) {
        base + Decimal::from(5)
    } else {
        base
    }
}

/// Per-order shipping cost used in the operating expense estimate.
pub const SHIPPING_COST_PER_ORDER: Decimal = Decimal::from_parts(30_000, 0, 0, false, 0);

/// Revenue share of platform, payment, marketing, packaging and service costs.
const OPERATING_COST_SHARE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Estimated operating expenses: a fixed revenue share plus per-order shipping.
#[must_use]
pub fn operating_expenses(revenue: Decimal, orders: i64) -> Decimal {
    round_money(revenue * OPERATING_COST_SHARE + SHIPPING_COST_PER_ORDER * Decimal::from(orders))
}

/// `part` as a percent of `revenue`, zero when there is no revenue.
#[must_use]
pub fn margin_percent(part: Decimal, revenue: Decimal) -> Decimal {
    if revenue > Decimal::ZERO {
        round_money(part / revenue * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn sales(day: u32, revenue: i64, orders: i64) -> DailySales {
        DailySales {
            date: date(day),
            revenue: Decimal::from(revenue),
            orders,
            products_sold: orders * 2,
            unique_customers: orders,
        }
    }

    #[test]
    fn test_fill_days_zero_fills() {
        let days = fill_days(date(1), 5, &[sales(2, 100, 1), sales(4, 50, 1)]);
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], DailySales::empty(date(1)));
        assert_eq!(days[1].revenue, Decimal::from(100));
        assert_eq!(days[4].date, date(5));
    }

    #[test]
    fn test_period_metrics() {
        let days = vec![sales(1, 0, 0), sales(2, 300, 3), sales(3, 100, 2), sales(4, 300, 1)];
        let metrics = PeriodMetrics::from_days(&days);
        assert_eq!(metrics.total_revenue, Decimal::from(700));
        assert_eq!(metrics.total_orders, 6);
        assert_eq!(metrics.days_with_sales, 3);
        assert_eq!(metrics.total_days, 4);
        // (100 + 50 + 300) / 3
        assert_eq!(metrics.average_order_value, Decimal::from(150));
        assert_eq!(metrics.average_daily_revenue, Decimal::from(175));
        assert_eq!(metrics.peak_day, Some(date(2)));
        assert_eq!(metrics.lowest_day, Some(date(1)));
    }

    #[test]
    fn test_empty_period() {
        let metrics = PeriodMetrics::from_days(&[]);
        assert_eq!(metrics.total_revenue, Decimal::ZERO);
        assert_eq!(metrics.average_order_value, Decimal::ZERO);
        assert_eq!(metrics.peak_day, None);
    }

    #[test]
    fn test_growth_against_previous_period() {
        let current = PeriodMetrics::from_days(&[sales(8, 200, 4)]);
        let previous = PeriodMetrics::from_days(&[sales(1, 100, 4)]);
        let growth = GrowthMetrics::between(&current, &previous);
        assert_eq!(growth.revenue, Decimal::from(100));
        assert_eq!(growth.orders, Decimal::ZERO);

        let from_nothing = GrowthMetrics::between(&current, &PeriodMetrics::from_days(&[]));
        assert_eq!(from_nothing.revenue, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_trend_direction() {
        let rising: Vec<DailySales> = (1..=5).map(|d| sales(d, i64::from(d) * 100, 1)).collect();
        let trend = TrendAnalysis::of(&rising);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!((trend.strength - 100.0).abs() < 1e-9);
        assert!(trend.is_accelerating);

        let falling: Vec<DailySales> = (1..=5).map(|d| sales(d, 600 - i64::from(d) * 100, 1)).collect();
        assert_eq!(TrendAnalysis::of(&falling).direction, TrendDirection::Decreasing);

        let flat: Vec<DailySales> = (1..=5).map(|d| sales(d, 100, 1)).collect();
        let trend = TrendAnalysis::of(&flat);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert!(trend.is_steady());
        assert!(!trend.is_accelerating);

        let short = TrendAnalysis::of(&[sales(1, 10, 1), sales(2, 500, 1)]);
        assert_eq!(short.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_volatility() {
        assert!(volatility(&[0.0, 0.0, 0.0]).abs() < f64::EPSILON);
        assert!(volatility(&[5.0, 5.0]).abs() < f64::EPSILON);
        // mean 10, population sd 5
        assert!((volatility(&[5.0, 15.0]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_estimates() {
        assert_eq!(cogs_percent(Decimal::from(500_000)), Decimal::from(55));
        assert_eq!(cogs_percent(Decimal::from(2_000_000)), Decimal::from(50));
        assert_eq!(cogs_percent(Decimal::from(50_000)), Decimal::from(60));

        // 16% of 1,000,000 plus two shipments
        assert_eq!(
            operating_expenses(Decimal::from(1_000_000), 2),
            Decimal::from(220_000)
        );
        assert_eq!(margin_percent(Decimal::from(45), Decimal::from(100)), Decimal::from(45));
        assert_eq!(margin_percent(Decimal::from(45), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_weekday_name() {
        // 2026-03-02 is a Monday
        assert_eq!(sales(2, 0, 0).weekday_name(), "Monday");
    }
}
