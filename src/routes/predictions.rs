//! Prediction routes: churn risk, revenue and usage forecasts.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::services::predictions::{
    self, ChurnPrediction, ForecastMetric, MonthlyRevenue, UsagePoint,
};
use crate::AppState;

/// Query params of GET /api/analytics/predictions/churn.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/analytics/predictions/churn
pub async fn churn(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ChurnQuery>,
) -> Result<Json<ApiResponse<Vec<ChurnPrediction>>>, AppError> {
    let predictions = predictions::churn(
        &state.store,
        query.user_id.as_deref(),
        query.limit.unwrap_or(10),
    )
    .await?;
    Ok(ApiResponse::success(predictions))
}

/// Query params of GET /api/analytics/predictions/revenue.
#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    /// Months to project beyond the history.
    pub period: Option<usize>,
}

/// GET /api/analytics/predictions/revenue
pub async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<ApiResponse<Vec<MonthlyRevenue>>>, AppError> {
    let period = query.period.unwrap_or(3);
    if period > 24 {
        return Err(AppError::validation("period must be at most 24 months"));
    }
    let forecast = predictions::revenue(&state.store, period).await?;
    Ok(ApiResponse::success(forecast))
}

/// Query params of GET /api/analytics/predictions/usage.
#[derive(Debug, Deserialize)]
pub struct UsageForecastQuery {
    /// `tokens` (default) or `sessions`.
    pub metric: Option<String>,
    /// Days to project beyond the trailing window.
    pub period: Option<i64>,
}

/// GET /api/analytics/predictions/usage
pub async fn usage(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UsageForecastQuery>,
) -> Result<Json<ApiResponse<Vec<UsagePoint>>>, AppError> {
    let metric = match query.metric.as_deref() {
        Some(raw) => ForecastMetric::parse(raw)?,
        None => ForecastMetric::Tokens,
    };
    let period = query.period.unwrap_or(7);
    if !(0..=90).contains(&period) {
        return Err(AppError::validation("period must be between 0 and 90 days"));
    }
    let forecast = predictions::usage_forecast(&state.store, metric, period).await?;
    Ok(ApiResponse::success(forecast))
}
