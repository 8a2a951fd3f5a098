//! Seller dashboard numbers, sales analytics and profit estimates.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::analytics::{
    DailySales, GrowthMetrics, PeriodMetrics, TrendAnalysis, TrendDirection, cogs_percent,
    fill_days, margin_percent, operating_expenses, weekday_name,
};
use shopx_core::pricing::{growth_percent, round_money};
use shopx_core::{OrderStatus, SellerId};

use super::{ServiceError, ServiceResult};
use crate::db::statistics::StatisticsRepository;
use crate::models::stats::{
    ChartAnalytics, ChartComparison, ChartDay, ChartInsights, OrderStatusCounts, ProductProfit,
    ProductSalesRow, ProfitAnalysis, ProfitQuery, RevenuePoint, RevenueSeriesQuery,
    SellerDashboard, SellerOrderSummary, TopCustomer, TopProduct, TopQuery,
};

/// Longest chart, in days.
const MAX_CHART_DAYS: u32 = 365;

/// Products listed in a profit analysis.
const TOP_PROFITABLE: usize = 10;

/// Start instants of the dashboard's reporting periods (UTC, weeks start Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStarts {
    pub today: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
    pub last_month: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl PeriodStarts {
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let week = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let month = today.with_day(1).unwrap_or(today);
        let last_month = month.checked_sub_months(Months::new(1)).unwrap_or(month);
        Self {
            today: midnight(today),
            week: midnight(week),
            month: midnight(month),
            last_month: midnight(last_month),
        }
    }
}

/// Turn an inclusive date range into a half-open instant range.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` when the start is after the end.
pub fn date_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ServiceResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(ServiceError::InvalidArgument(
            "start_date must not be after end_date".to_owned(),
        ));
    }
    let from = start.map(midnight);
    let until = end.map(|d| midnight(d.checked_add_days(Days::new(1)).unwrap_or(d)));
    Ok((from, until))
}

/// Parse a comma-separated status list.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for an empty list or, naming
/// them, any unknown statuses.
pub fn parse_statuses(list: &str) -> ServiceResult<Vec<OrderStatus>> {
    let mut statuses = Vec::new();
    let mut unknown = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<OrderStatus>() {
            Ok(status) if !statuses.contains(&status) => statuses.push(status),
            Ok(_) => {}
            Err(_) => unknown.push(part),
        }
    }
    if !unknown.is_empty() {
        let valid: Vec<&str> = OrderStatus::ALL.iter().map(OrderStatus::as_str).collect();
        return Err(ServiceError::InvalidArgument(format!(
            "unknown statuses: {}; valid statuses are {}",
            unknown.join(", "),
            valid.join(", ")
        )));
    }
    if statuses.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "at least one status is required".to_owned(),
        ));
    }
    Ok(statuses)
}

/// Days covered by a comparison timeframe; unknown values mean a week.
#[must_use]
pub fn timeframe_days(timeframe: &str) -> u32 {
    match timeframe.trim().to_ascii_lowercase().as_str() {
        "14d" => 14,
        "30d" => 30,
        "90d" => 90,
        _ => 7,
    }
}

/// Assemble the chart from the current and previous runs of days.
#[must_use]
pub fn chart_from(current: Vec<DailySales>, previous: &[DailySales]) -> ChartAnalytics {
    let current_period = PeriodMetrics::from_days(&current);
    let previous_period = PeriodMetrics::from_days(previous);
    let growth = GrowthMetrics::between(&current_period, &previous_period);
    let trend = TrendAnalysis::of(&current);
    let days = u32::try_from(current.len()).unwrap_or(u32::MAX);
    let start_date = current.first().map(|d| d.date).unwrap_or_default();
    let end_date = current.last().map(|d| d.date).unwrap_or_default();

    let signed = |v: Decimal| {
        let v = v.normalize();
        if v >= Decimal::ZERO { format!("+{v}") } else { v.to_string() }
    };
    let direction = match trend.direction {
        TrendDirection::Increasing => "increasing",
        TrendDirection::Decreasing => "decreasing",
        TrendDirection::Stable => "stable",
    };
    let summary = format!(
        "Last {days} days: revenue {} ({}%), {} orders ({}%). Trend: {direction}.",
        current_period.total_revenue.normalize(),
        signed(growth.revenue),
        current_period.total_orders,
        signed(growth.orders),
    );

    ChartAnalytics {
        days,
        start_date,
        end_date,
        daily: current.into_iter().map(ChartDay::from).collect(),
        current_period,
        previous_period,
        growth,
        trend,
        summary,
    }
}

#[must_use]
pub fn insights(chart: &ChartAnalytics) -> ChartInsights {
    let name = |d: Option<NaiveDate>| d.map(|d| weekday_name(d.weekday()));
    ChartInsights {
        best_day: name(chart.current_period.peak_day),
        worst_day: name(chart.current_period.lowest_day),
        consistency: if chart.trend.is_steady() { "steady" } else { "volatile" },
        outlook: match chart.trend.direction {
            TrendDirection::Increasing => "positive",
            TrendDirection::Decreasing => "needs_improvement",
            TrendDirection::Stable => "stable",
        },
    }
}

fn profit_notes(revenue: Decimal, gross_margin: Decimal, net_margin: Decimal) -> Vec<String> {
    let mut notes = Vec::new();
    if revenue < Decimal::from(1_000_000) {
        notes.push("Revenue is still low; more marketing or a wider range could help.");
    } else if revenue > Decimal::from(10_000_000) {
        notes.push("Revenue is healthy; focus on efficiency.");
    }
    if gross_margin < Decimal::from(20) {
        notes.push("Gross margin is thin; review prices or purchase costs.");
    } else if gross_margin > Decimal::from(40) {
        notes.push("Gross margin is strong; discounts could buy volume.");
    }
    if net_margin < Decimal::from(5) {
        notes.push("Net margin is low; operating costs need trimming.");
    } else if net_margin > Decimal::from(15) {
        notes.push("Net margin is excellent; there is room to expand.");
    }
    notes.push("Costs are market estimates, not the seller's actual costs.");
    notes.into_iter().map(str::to_owned).collect()
}

/// Estimate profit from per-product sales and the number of orders.
#[must_use]
pub fn profit_from(
    start_date: NaiveDate,
    end_date: NaiveDate,
    rows: &[ProductSalesRow],
    total_orders: i64,
) -> ProfitAnalysis {
    let mut products: Vec<ProductProfit> = rows
        .iter()
        .map(|row| {
            let average_price = if row.quantity_sold > 0 {
                row.revenue / Decimal::from(row.quantity_sold)
            } else {
                Decimal::ZERO
            };
            let estimated_cogs =
                round_money(row.revenue * cogs_percent(average_price) / Decimal::ONE_HUNDRED);
            let gross_profit = row.revenue - estimated_cogs;
            ProductProfit {
                product_id: row.product_id,
                product_name: row.product_name.clone(),
                revenue: row.revenue,
                estimated_cogs,
                gross_profit,
                quantity_sold: row.quantity_sold,
                profit_margin: margin_percent(gross_profit, row.revenue),
            }
        })
        .collect();

    if products.is_empty() {
        return ProfitAnalysis {
            start_date,
            end_date,
            total_revenue: Decimal::ZERO,
            estimated_cogs: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_profit_margin: Decimal::ZERO,
            estimated_operating_expenses: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            net_profit_margin: Decimal::ZERO,
            total_orders: 0,
            total_quantity_sold: 0,
            average_order_profit: Decimal::ZERO,
            top_profitable_products: Vec::new(),
            notes: vec!["No revenue-countable orders in this period.".to_owned()],
        };
    }

    let total_revenue: Decimal = products.iter().map(|p| p.revenue).sum();
    let estimated_cogs: Decimal = products.iter().map(|p| p.estimated_cogs).sum();
    let gross_profit = total_revenue - estimated_cogs;
    let estimated_operating_expenses = operating_expenses(total_revenue, total_orders);
    let net_profit = gross_profit - estimated_operating_expenses;
    let gross_profit_margin = margin_percent(gross_profit, total_revenue);
    let net_profit_margin = margin_percent(net_profit, total_revenue);
    let average_order_profit = if total_orders > 0 {
        round_money(net_profit / Decimal::from(total_orders))
    } else {
        Decimal::ZERO
    };

    products.sort_by(|a, b| b.gross_profit.cmp(&a.gross_profit));
    products.truncate(TOP_PROFITABLE);

    ProfitAnalysis {
        start_date,
        end_date,
        total_revenue,
        estimated_cogs,
        gross_profit,
        gross_profit_margin,
        estimated_operating_expenses,
        net_profit,
        net_profit_margin,
        total_orders,
        total_quantity_sold: rows.iter().map(|r| r.quantity_sold).sum(),
        average_order_profit,
        top_profitable_products: products,
        notes: profit_notes(total_revenue, gross_profit_margin, net_profit_margin),
    }
}

pub struct StatisticsService<'a> {
    stats: StatisticsRepository<'a>,
}

impl<'a> StatisticsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stats: StatisticsRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip(self, now))]
    pub async fn dashboard(
        &self,
        seller_id: SellerId,
        now: DateTime<Utc>,
    ) -> ServiceResult<SellerDashboard> {
        let starts = PeriodStarts::at(now);

        let total = self.stats.revenue(seller_id, None, None).await?;
        let today = self.stats.revenue(seller_id, Some(starts.today), None).await?;
        let week = self.stats.revenue(seller_id, Some(starts.week), None).await?;
        let month = self.stats.revenue(seller_id, Some(starts.month), None).await?;
        let last_month = self
            .stats
            .revenue(seller_id, Some(starts.last_month), Some(starts.month))
            .await?;

        let counts = self.order_status_counts(seller_id).await?;
        let products = self.stats.product_counts(seller_id).await?;

        Ok(SellerDashboard {
            total_revenue: total.revenue,
            total_order_count: counts.total(),
            total_product_count: products.total,
            available_product_count: products.available,
            pending_orders_count: counts.pending_confirmation,
            processing_orders_count: counts.processing + counts.shipping,
            completed_orders_count: counts.delivered + counts.refund_rejected + counts.completed,
            cancelled_orders_count: counts.cancelled + counts.refunded,
            revenue_today: today.revenue,
            revenue_this_week: week.revenue,
            revenue_this_month: month.revenue,
            revenue_last_month: last_month.revenue,
            revenue_trend_percentage: growth_percent(month.revenue, last_month.revenue),
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an inverted range.
    pub async fn revenue_series(
        &self,
        seller_id: SellerId,
        query: RevenueSeriesQuery,
    ) -> ServiceResult<Vec<RevenuePoint>> {
        let (from, until) = date_window(Some(query.start_date), Some(query.end_date))?;
        let (Some(from), Some(until)) = (from, until) else {
            return Ok(Vec::new());
        };
        Ok(self
            .stats
            .revenue_series(seller_id, from, until, query.group_by)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an inverted range.
    pub async fn top_products(&self, seller_id: SellerId, query: TopQuery) -> ServiceResult<Vec<TopProduct>> {
        let (from, until) = date_window(query.start_date, query.end_date)?;
        Ok(self
            .stats
            .top_products(seller_id, from, until, query.clamped())
            .await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an inverted range.
    pub async fn top_customers(
        &self,
        seller_id: SellerId,
        query: TopQuery,
    ) -> ServiceResult<Vec<TopCustomer>> {
        let (from, until) = date_window(query.start_date, query.end_date)?;
        Ok(self
            .stats
            .top_customers(seller_id, from, until, query.clamped())
            .await?)
    }

    /// Daily sales for the `days` days ending today, against the `days` before.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` unless `days` is 1 to 365.
    #[instrument(skip(self, now))]
    pub async fn chart_analytics(
        &self,
        seller_id: SellerId,
        days: u32,
        now: DateTime<Utc>,
    ) -> ServiceResult<ChartAnalytics> {
        if !(1..=MAX_CHART_DAYS).contains(&days) {
            return Err(ServiceError::InvalidArgument(format!(
                "days must be between 1 and {MAX_CHART_DAYS}"
            )));
        }
        let today = now.date_naive();
        let span = Days::new(u64::from(days));
        let start = (today + Days::new(1)) - span;
        let previous_start = start - span;

        let rows: Vec<DailySales> = self
            .stats
            .daily_sales(seller_id, midnight(previous_start), midnight(today + Days::new(1)))
            .await?
            .into_iter()
            .map(DailySales::from)
            .collect();

        let previous = fill_days(previous_start, days, &rows);
        let current = fill_days(start, days, &rows);
        Ok(chart_from(current, &previous))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn chart_comparison(
        &self,
        seller_id: SellerId,
        timeframe: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<ChartComparison> {
        let data = self
            .chart_analytics(seller_id, timeframe_days(timeframe), now)
            .await?;
        Ok(ChartComparison {
            timeframe: timeframe.to_owned(),
            insights: insights(&data),
            data,
        })
    }

    /// Estimated profit over revenue-countable orders. The range defaults to
    /// the first of the end date's month through the end date (today).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an inverted range.
    #[instrument(skip(self, now))]
    pub async fn profit_analysis(
        &self,
        seller_id: SellerId,
        query: ProfitQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<ProfitAnalysis> {
        let end = query.end_date.unwrap_or_else(|| now.date_naive());
        let start = query.start_date.unwrap_or_else(|| end.with_day(1).unwrap_or(end));
        let (from, until) = date_window(Some(start), Some(end))?;

        let rows = self.stats.product_sales(seller_id, from, until).await?;
        let totals = self.stats.revenue(seller_id, from, until).await?;
        Ok(profit_from(start, end, &rows, totals.orders_count))
    }

    /// The seller's orders in any of the comma-separated `statuses`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an empty or unknown status.
    pub async fn orders_by_status(
        &self,
        seller_id: SellerId,
        statuses: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<SellerOrderSummary>> {
        let statuses = parse_statuses(statuses)?;
        let today = midnight(now.date_naive());
        Ok(self
            .stats
            .orders_by_status(seller_id, &statuses, today)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn order_status_counts(&self, seller_id: SellerId) -> ServiceResult<OrderStatusCounts> {
        let rows = self.stats.status_counts(seller_id).await?;
        Ok(OrderStatusCounts::from_rows(&rows))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_starts_midweek() {
        // Thursday
        let now = Utc.with_ymd_and_hms(2026, 3, 12, 15, 30, 0).unwrap();
        let starts = PeriodStarts::at(now);
        assert_eq!(starts.today, Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap());
        assert_eq!(starts.week, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
        assert_eq!(starts.month, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(starts.last_month, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_period_starts_across_year() {
        // Friday, 2027-01-01; the week began in December
        let now = Utc.with_ymd_and_hms(2027, 1, 1, 8, 0, 0).unwrap();
        let starts = PeriodStarts::at(now);
        assert_eq!(starts.week, Utc.with_ymd_and_hms(2026, 12, 28, 0, 0, 0).unwrap());
        assert_eq!(starts.last_month, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
    }

    fn day(d: u32, revenue: i64, orders: i64) -> DailySales {
        DailySales {
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            revenue: Decimal::from(revenue),
            orders,
            products_sold: orders,
            unique_customers: orders,
        }
    }

    fn product(id: i32, revenue: i64, quantity: i64) -> ProductSalesRow {
        ProductSalesRow {
            product_id: shopx_core::ProductId::new(id),
            product_name: format!("Product {id}"),
            revenue: Decimal::from(revenue),
            quantity_sold: quantity,
        }
    }

    #[test]
    fn test_parse_statuses() {
        assert_eq!(
            parse_statuses("delivered, Shipping,delivered").unwrap(),
            vec![OrderStatus::Delivered, OrderStatus::Shipping]
        );
        assert!(parse_statuses(" , ").is_err());
        let err = parse_statuses("delivered,lost").unwrap_err();
        assert!(err.to_string().contains("lost"));
    }

    #[test]
    fn test_timeframe_days() {
        assert_eq!(timeframe_days("30D"), 30);
        assert_eq!(timeframe_days("90d"), 90);
        assert_eq!(timeframe_days("year"), 7);
    }

    #[test]
    fn test_chart_from_compares_periods() {
        let current = vec![day(8, 100, 1), day(9, 200, 2), day(10, 300, 3)];
        let previous = vec![day(5, 100, 1), day(6, 100, 1), day(7, 100, 1)];
        let chart = chart_from(current, &previous);
        assert_eq!(chart.days, 3);
        assert_eq!(chart.start_date, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert_eq!(chart.current_period.total_revenue, Decimal::from(600));
        assert_eq!(chart.growth.revenue, Decimal::from(100));
        assert_eq!(chart.trend.direction, TrendDirection::Increasing);
        assert_eq!(chart.daily[0].label, "08/03");
        assert!(chart.summary.starts_with("Last 3 days: revenue 600 (+100%)"));
        assert!(chart.summary.ends_with("Trend: increasing."));

        let insight = insights(&chart);
        // 2026-03-10 is a Tuesday, 2026-03-08 a Sunday
        assert_eq!(insight.best_day, Some("Tuesday"));
        assert_eq!(insight.worst_day, Some("Sunday"));
        assert_eq!(insight.outlook, "positive");
        assert_eq!(insight.consistency, "volatile");
    }

    #[test]
    fn test_profit_from_sales() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        // avg price 500k -> 55% cost; avg price 50k -> 60% cost
        let analysis = profit_from(start, end, &[product(1, 1_000_000, 2), product(2, 100_000, 2)], 2);
        assert_eq!(analysis.total_revenue, Decimal::from(1_100_000));
        assert_eq!(analysis.estimated_cogs, Decimal::from(610_000));
        assert_eq!(analysis.gross_profit, Decimal::from(490_000));
        // 16% of revenue plus 2 x 30k shipping
        assert_eq!(analysis.estimated_operating_expenses, Decimal::from(236_000));
        assert_eq!(analysis.net_profit, Decimal::from(254_000));
        assert_eq!(analysis.average_order_profit, Decimal::from(127_000));
        assert_eq!(analysis.total_quantity_sold, 4);
        assert_eq!(analysis.top_profitable_products[0].product_id, shopx_core::ProductId::new(1));
        assert_eq!(analysis.top_profitable_products[1].profit_margin, Decimal::from(40));
    }

    #[test]
    fn test_profit_without_sales() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let analysis = profit_from(start, start, &[], 0);
        assert_eq!(analysis.net_profit, Decimal::ZERO);
        assert!(analysis.top_profitable_products.is_empty());
        assert_eq!(analysis.notes.len(), 1);
    }

    #[test]
    fn test_date_window_is_end_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        let (from, until) = date_window(Some(start), Some(end)).unwrap();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()));
        assert_eq!(until, Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()));

        assert_eq!(date_window(None, None).unwrap(), (None, None));
        assert!(date_window(Some(end), Some(start)).is_err());
    }
}
