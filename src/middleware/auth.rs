//! Session-cookie authentication extractor for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::errors::AppError;
use crate::models::user::UserRole;
use crate::services::session::{self, SESSION_COOKIE};
use crate::AppState;

/// Authenticated caller extracted from the session cookie.
///
/// Use as an Axum extractor in handlers that require authentication:
/// ```ignore
/// async fn handler(current_user: CurrentUser) -> impl IntoResponse { ... }
/// ```
///
/// Rejects with 401 before any store query when the cookie is missing,
/// undecodable, or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
    pub role: UserRole,
    /// Session issue time, the CSRF token derivation input.
    pub issued_at: i64,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let cookie = jar.get(SESSION_COOKIE).ok_or(AppError::Unauthorized)?;

        let claims = session::verify_session(cookie.value(), &state.config.session_secret)?;

        let role = UserRole::parse(&claims.role).ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser {
            uid: claims.sub,
            email: claims.email,
            role,
            issued_at: claims.iat,
        })
    }
}
