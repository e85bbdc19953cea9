//! User patch routes. Admin + CSRF; role changes need superAdmin.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::csrf::CsrfGuard;
use crate::models::user::{
    FeatureFlagOverrideResponse, FeatureFlagsRequest, UpdateUserRequest, UserResponse, UserRole,
};
use crate::services::users;
use crate::AppState;

/// POST /api/users/{id}/update — patch user fields.
pub async fn update(
    State(state): State<AppState>,
    CsrfGuard(current_user): CsrfGuard,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    if current_user.role < UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    let updated = users::update(&state.store, &user_id, &body, &current_user).await?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/users/{id}/feature-flags — replace flag overrides.
pub async fn feature_flags(
    State(state): State<AppState>,
    CsrfGuard(current_user): CsrfGuard,
    Path(user_id): Path<String>,
    Json(body): Json<FeatureFlagsRequest>,
) -> Result<Json<ApiResponse<FeatureFlagOverrideResponse>>, AppError> {
    if current_user.role < UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    let result = users::set_feature_flags(&state.store, &user_id, &body, &current_user).await?;
    Ok(ApiResponse::success(result))
}
