//! Analytics aggregation routes. Each accepts `{start, end}` and returns
//! one metrics object; all are admin-gated.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::range::DateRange;
use crate::services::analytics::{
    self, CallLogMetrics, ContactMetrics, ConversionMetrics, ExportMetrics, MindmapEditMetrics,
};
use crate::services::retention::{self, RetentionMetrics};
use crate::services::security::{self, SecurityMetrics};
use crate::AppState;

/// POST /api/analytics/call-logs
pub async fn call_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<CallLogMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = analytics::call_logs(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/contacts
pub async fn contacts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<ContactMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = analytics::contacts(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/export-rate
pub async fn export_rate(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<ExportMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = analytics::export_rate(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/file-conversion-rate
pub async fn file_conversion_rate(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<ConversionMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = analytics::file_conversion_rate(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/mindmap-edit-count
pub async fn mindmap_edit_count(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<MindmapEditMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = analytics::mindmap_edit_count(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/security
pub async fn security(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<SecurityMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = security::overview(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}

/// POST /api/analytics/user-retention
pub async fn user_retention(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<DateRange>,
) -> Result<Json<ApiResponse<RetentionMetrics>>, AppError> {
    let range = body.parse()?;
    let metrics = retention::user_retention(&state.store, &range).await?;
    Ok(ApiResponse::success(metrics))
}
