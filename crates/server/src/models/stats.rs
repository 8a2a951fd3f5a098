//! Seller dashboard and statistics types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopx_core::analytics::{DailySales, GrowthMetrics, PeriodMetrics, TrendAnalysis};
use shopx_core::{OrderId, OrderStatus, ProductId, UserId};

/// Headline numbers for a seller's dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SellerDashboard {
    pub total_revenue: Decimal,
    pub total_order_count: i64,
    pub total_product_count: i64,
    pub available_product_count: i64,
    pub pending_orders_count: i64,
    pub processing_orders_count: i64,
    pub completed_orders_count: i64,
    pub cancelled_orders_count: i64,
    pub revenue_today: Decimal,
    pub revenue_this_week: Decimal,
    pub revenue_this_month: Decimal,
    pub revenue_last_month: Decimal,
    pub revenue_trend_percentage: Decimal,
}

/// Revenue of a seller's lines between two instants.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct RevenueTotals {
    pub revenue: Decimal,
    pub orders_count: i64,
}

/// Product counts for a seller.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct ProductCounts {
    pub total: i64,
    pub available: i64,
}

/// Granularity of a revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Day,
    Month,
}

impl GroupBy {
    /// `date_trunc` unit.
    #[must_use]
    pub const fn trunc_unit(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
        }
    }
}

/// Query parameters for a revenue series.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RevenueSeriesQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub group_by: GroupBy,
}

/// One point of a revenue series.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RevenuePoint {
    pub period: NaiveDate,
    pub revenue: Decimal,
    pub orders_count: i64,
    pub products_sold: i64,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub unit_price: Decimal,
    pub remaining_stock: i32,
}

/// A customer ranked by spend with one seller.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopCustomer {
    pub customer_id: UserId,
    pub customer_name: Option<String>,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub first_order_date: DateTime<Utc>,
    pub last_order_date: DateTime<Utc>,
}

/// Number of a seller's orders in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStatusCounts {
    pub pending_confirmation: i64,
    pub processing: i64,
    pub shipping: i64,
    pub delivered: i64,
    pub refund_requested: i64,
    pub refund_rejected: i64,
    pub cancelled: i64,
    pub refunded: i64,
    pub completed: i64,
}

impl OrderStatusCounts {
    /// Fold `(status, count)` rows into per-status counters.
    #[must_use]
    pub fn from_rows(rows: &[(OrderStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for &(status, count) in rows {
            let slot = match status {
                OrderStatus::PendingConfirmation => &mut counts.pending_confirmation,
                OrderStatus::Processing => &mut counts.processing,
                OrderStatus::Shipping => &mut counts.shipping,
                OrderStatus::Delivered => &mut counts.delivered,
                OrderStatus::RefundRequested => &mut counts.refund_requested,
                OrderStatus::RefundRejected => &mut counts.refund_rejected,
                OrderStatus::Cancelled => &mut counts.cancelled,
                OrderStatus::Refunded => &mut counts.refunded,
                OrderStatus::Completed => &mut counts.completed,
            };
            *slot += count;
        }
        counts
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.pending_confirmation
            + self.processing
            + self.shipping
            + self.delivered
            + self.refund_requested
            + self.refund_rejected
            + self.cancelled
            + self.refunded
            + self.completed
    }
}

/// `?limit=&start_date=&end_date=` for ranked lists.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top")]
    pub limit: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

const fn default_top() -> i64 {
    5
}

impl TopQuery {
    #[must_use]
    pub fn clamped(self) -> i64 {
        self.limit.clamp(1, 50)
    }
}

/// `?statuses=delivered,shipping` for the seller's order list.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusListQuery {
    #[serde(default)]
    pub statuses: String,
}

/// One of a seller's orders, with only the seller's lines totalled.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerOrderSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub seller_total: Decimal,
    pub total_items: i64,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub created_today: bool,
}

/// A day of seller sales as aggregated in SQL.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct DailySalesRow {
    pub day: NaiveDate,
    pub revenue: Decimal,
    pub orders: i64,
    pub products_sold: i64,
    pub unique_customers: i64,
}

impl From<DailySalesRow> for DailySales {
    fn from(row: DailySalesRow) -> Self {
        Self {
            date: row.day,
            revenue: row.revenue,
            orders: row.orders,
            products_sold: row.products_sold,
            unique_customers: row.unique_customers,
        }
    }
}

/// `?days=` for chart analytics, 1 to 365.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChartQuery {
    #[serde(default = "default_chart_days")]
    pub days: u32,
}

const fn default_chart_days() -> u32 {
    7
}

/// `?timeframe=7d|14d|30d|90d` for the chart comparison.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeframeQuery {
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_timeframe() -> String {
    "7d".to_owned()
}

/// A chart day with its display labels.
#[derive(Debug, Clone, Serialize)]
pub struct ChartDay {
    #[serde(flatten)]
    pub sales: DailySales,
    /// `dd/MM`
    pub label: String,
    pub day_name: &'static str,
    pub average_order_value: Decimal,
}

impl From<DailySales> for ChartDay {
    fn from(sales: DailySales) -> Self {
        Self {
            label: sales.date.format("%d/%m").to_string(),
            day_name: sales.weekday_name(),
            average_order_value: sales.average_order_value(),
            sales,
        }
    }
}

/// Daily revenue for the last `days` days, measured against the `days`
/// before them.
#[derive(Debug, Clone, Serialize)]
pub struct ChartAnalytics {
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily: Vec<ChartDay>,
    pub current_period: PeriodMetrics,
    pub previous_period: PeriodMetrics,
    pub growth: GrowthMetrics,
    pub trend: TrendAnalysis,
    pub summary: String,
}

/// Plain-language reading of a chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartInsights {
    pub best_day: Option<&'static str>,
    pub worst_day: Option<&'static str>,
    /// `steady` or `volatile`.
    pub consistency: &'static str,
    /// `positive`, `needs_improvement` or `stable`.
    pub outlook: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartComparison {
    pub timeframe: String,
    pub data: ChartAnalytics,
    pub insights: ChartInsights,
}

/// `?start_date=&end_date=` for the profit analysis; defaults to this month.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProfitQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Units and revenue of one product in revenue-countable orders.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSalesRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub revenue: Decimal,
    pub quantity_sold: i64,
}

/// Estimated profit on one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductProfit {
    pub product_id: ProductId,
    pub product_name: String,
    pub revenue: Decimal,
    pub estimated_cogs: Decimal,
    pub gross_profit: Decimal,
    pub quantity_sold: i64,
    pub profit_margin: Decimal,
}

/// Estimated profit and loss for a seller over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitAnalysis {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_revenue: Decimal,
    pub estimated_cogs: Decimal,
    pub gross_profit: Decimal,
    pub gross_profit_margin: Decimal,
    pub estimated_operating_expenses: Decimal,
    pub net_profit: Decimal,
    pub net_profit_margin: Decimal,
    pub total_orders: i64,
    pub total_quantity_sold: i64,
    pub average_order_profit: Decimal,
    pub top_profitable_products: Vec<ProductProfit>,
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_from_rows() {
        let counts = OrderStatusCounts::from_rows(&[
            (OrderStatus::Processing, 4),
            (OrderStatus::Delivered, 2),
            (OrderStatus::Completed, 7),
        ]);
        assert_eq!(counts.processing, 4);
        assert_eq!(counts.delivered, 2);
        assert_eq!(counts.completed, 7);
        assert_eq!(counts.cancelled, 0);
        assert_eq!(counts.total(), 13);
    }

    #[test]
    fn test_chart_day_labels() {
        let sales = DailySales {
            date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap_or_default(),
            revenue: Decimal::from(90),
            orders: 3,
            products_sold: 4,
            unique_customers: 2,
        };
        let day = ChartDay::from(sales);
        assert_eq!(day.label, "07/03");
        assert_eq!(day.day_name, "Saturday");
        assert_eq!(day.average_order_value, Decimal::from(30));
    }
}
