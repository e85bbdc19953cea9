//! Saved dashboard routes, available to any authenticated user.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::csrf::CsrfGuard;
use crate::models::dashboard::{DashboardResponse, SaveDashboardRequest};
use crate::services::dashboards;
use crate::AppState;

/// GET /api/dashboards — the caller's saved dashboards.
pub async fn list(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<DashboardResponse>>>, AppError> {
    let result = dashboards::list(&state.store, &current_user.uid).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/dashboards — create, or update by `id`. CSRF-protected.
pub async fn save(
    State(state): State<AppState>,
    CsrfGuard(current_user): CsrfGuard,
    Json(body): Json<SaveDashboardRequest>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let result = dashboards::save(&state.store, &current_user.uid, body).await?;
    Ok(ApiResponse::success(result))
}
