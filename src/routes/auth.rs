//! Session-scoped auth helpers. Login itself happens at the identity
//! provider; this API only issues CSRF tokens for existing sessions.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::services::session;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfToken {
    pub csrf_token: String,
}

/// GET /api/auth/csrf-token — token for the caller's session, echoed back
/// in `X-CSRF-Token` on mutating requests.
pub async fn csrf_token(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<CsrfToken>>, AppError> {
    let token = session::csrf_token(
        &current_user.uid,
        current_user.issued_at,
        &state.config.csrf_secret,
    );
    Ok(ApiResponse::success(CsrfToken { csrf_token: token }))
}
