//! Team administration routes.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::csrf::CsrfGuard;
use crate::middleware::rbac::RequireAdmin;
use crate::models::user::UserRole;
use crate::models::workspace::{RemoveMemberRequest, TeamApiAction};
use crate::services::teams::{self, AuditLogPage, AuditLogQuery, TeamApiOutcome};
use crate::AppState;

/// POST /api/teams/{id}/api — manage API keys and webhooks. Admin + CSRF.
pub async fn api_action(
    State(state): State<AppState>,
    CsrfGuard(current_user): CsrfGuard,
    Path(workspace_id): Path<String>,
    Json(body): Json<TeamApiAction>,
) -> Result<Json<ApiResponse<TeamApiOutcome>>, AppError> {
    require_admin(&current_user)?;
    let outcome = teams::api_action(&state.store, &workspace_id, body, &current_user).await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/teams/{id}/audit-logs — paged audit entries, newest first.
pub async fn audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(workspace_id): Path<String>,
    Json(body): Json<AuditLogQuery>,
) -> Result<Json<ApiResponse<AuditLogPage>>, AppError> {
    let page = teams::audit_logs(&state.store, &workspace_id, &body).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/teams/{id}/users/remove — pull a member. Admin + CSRF.
pub async fn remove_member(
    State(state): State<AppState>,
    CsrfGuard(current_user): CsrfGuard,
    Path(workspace_id): Path<String>,
    Json(body): Json<RemoveMemberRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    require_admin(&current_user)?;
    teams::remove_member(&state.store, &workspace_id, &body, &current_user).await?;
    Ok(ApiResponse::success(serde_json::json!({ "removed": true })))
}

/// CSRF-guarded routes authenticate through the guard, so the role gate
/// is re-checked here instead of via a second extractor.
fn require_admin(user: &crate::middleware::auth::CurrentUser) -> Result<(), AppError> {
    if user.role < UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}
