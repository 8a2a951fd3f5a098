//! Admin revenue reports.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::report::{ReportQuery, RevenueReport, YearQuery};
use crate::services::reports::ReportService;
use crate::state::AppState;

/// GET /api/reports/monthly?year=
pub async fn monthly(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<YearQuery>,
) -> Result<Json<RevenueReport>> {
    Ok(Json(ReportService::new(state.pool()).monthly_revenue(query.year).await?))
}

/// GET /api/reports/revenue?interval=&year=&quarter=&month=
pub async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ReportQuery>,
) -> Result<Json<RevenueReport>> {
    let report = ReportService::new(state.pool())
        .revenue(&query, Utc::now())
        .await?;
    Ok(Json(report))
}
