//! Usage aggregation routes over processing jobs.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::range::DateRange;
use crate::services::usage::{self, DailyTokens, SessionsMetrics, UsageScope};
use crate::AppState;

/// Body of the usage routes: a date range plus optional scoping.
#[derive(Debug, Deserialize)]
pub struct UsageRequest {
    #[serde(flatten)]
    pub range: DateRange,
    #[serde(flatten)]
    pub scope: UsageScope,
}

/// POST /api/usage/daily-tokens — `[{date, tokens}]` ascending.
pub async fn daily_tokens(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<UsageRequest>,
) -> Result<Json<ApiResponse<Vec<DailyTokens>>>, AppError> {
    let range = body.range.parse()?;
    let series = usage::daily_tokens(&state.store, &range, &body.scope).await?;
    Ok(ApiResponse::success(series))
}

/// POST /api/usage/sessions — distinct sessions per day plus overall.
pub async fn sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<UsageRequest>,
) -> Result<Json<ApiResponse<SessionsMetrics>>, AppError> {
    let range = body.range.parse()?;
    let metrics = usage::sessions(&state.store, &range, &body.scope).await?;
    Ok(ApiResponse::success(metrics))
}
