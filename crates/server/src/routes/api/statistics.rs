//! Seller dashboard routes. All figures are scoped to the caller's shop.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::error::Result;
use crate::middleware::RequireSeller;
use crate::models::stats::{
    ChartAnalytics, ChartComparison, ChartQuery, OrderStatusCounts, ProfitAnalysis, ProfitQuery,
    RevenuePoint, RevenueSeriesQuery, SellerDashboard, SellerOrderSummary, StatusListQuery,
    TimeframeQuery, TopCustomer, TopProduct, TopQuery,
};
use crate::services::statistics::StatisticsService;
use crate::state::AppState;

/// GET /api/statistics/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<SellerDashboard>> {
    let dashboard = StatisticsService::new(state.pool())
        .dashboard(seller.seller_id, Utc::now())
        .await?;
    Ok(Json(dashboard))
}

/// GET /api/statistics/revenue?start_date=&end_date=&group_by=
pub async fn revenue(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<RevenueSeriesQuery>,
) -> Result<Json<Vec<RevenuePoint>>> {
    let series = StatisticsService::new(state.pool())
        .revenue_series(seller.seller_id, query)
        .await?;
    Ok(Json(series))
}

/// GET /api/statistics/top-products
pub async fn top_products(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<TopProduct>>> {
    let products = StatisticsService::new(state.pool())
        .top_products(seller.seller_id, query)
        .await?;
    Ok(Json(products))
}

/// GET /api/statistics/top-customers
pub async fn top_customers(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<TopCustomer>>> {
    let customers = StatisticsService::new(state.pool())
        .top_customers(seller.seller_id, query)
        .await?;
    Ok(Json(customers))
}

/// GET /api/statistics/order-status
pub async fn order_status(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<OrderStatusCounts>> {
    let counts = StatisticsService::new(state.pool())
        .order_status_counts(seller.seller_id)
        .await?;
    Ok(Json(counts))
}

/// GET /api/statistics/orders-by-status?statuses=pending,processing
pub async fn orders_by_status(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<StatusListQuery>,
) -> Result<Json<Vec<SellerOrderSummary>>> {
    let orders = StatisticsService::new(state.pool())
        .orders_by_status(seller.seller_id, &query.statuses, Utc::now())
        .await?;
    Ok(Json(orders))
}

/// GET /api/statistics/chart-analytics?days=
pub async fn chart_analytics(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartAnalytics>> {
    let chart = StatisticsService::new(state.pool())
        .chart_analytics(seller.seller_id, query.days, Utc::now())
        .await?;
    Ok(Json(chart))
}

/// GET /api/statistics/chart-analytics/compare?timeframe=7d|14d|30d|90d
pub async fn chart_comparison(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<TimeframeQuery>,
) -> Result<Json<ChartComparison>> {
    let comparison = StatisticsService::new(state.pool())
        .chart_comparison(seller.seller_id, &query.timeframe, Utc::now())
        .await?;
    Ok(Json(comparison))
}

/// GET /api/statistics/profit-analysis?start_date=&end_date=
pub async fn profit_analysis(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(query): Query<ProfitQuery>,
) -> Result<Json<ProfitAnalysis>> {
    let analysis = StatisticsService::new(state.pool())
        .profit_analysis(seller.seller_id, query, Utc::now())
        .await?;
    Ok(Json(analysis))
}
