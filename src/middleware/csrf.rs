//! CSRF guard for state-changing routes.
//!
//! Clients fetch their token from `GET /api/auth/csrf-token` and echo it
//! back in the `X-CSRF-Token` header on every mutating request.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::services::session;
use crate::AppState;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Extractor that authenticates the caller and verifies the CSRF header
/// against the token derived from their session.
#[derive(Debug, Clone)]
pub struct CsrfGuard(pub CurrentUser);

impl FromRequestParts<AppState> for CsrfGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let presented = parts
            .headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Forbidden("Missing X-CSRF-Token header".to_string()))?;

        session::verify_csrf(
            presented,
            &user.uid,
            user.issued_at,
            &state.config.csrf_secret,
        )?;

        Ok(CsrfGuard(user))
    }
}
