//! Route definitions for the CallMap admin API.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod dashboards;
pub mod health;
pub mod predictions;
pub mod teams;
pub mod usage;
pub mod users;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::csrf::CSRF_HEADER;
use crate::AppState;

/// Maximum accepted request body, generous for widget payloads.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Build the full application router. Shared between `main` and the
/// end-to-end test.
pub fn router(state: AppState) -> Router {
    // Cookie-authenticated CORS requires an exact origin, not a wildcard.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
        .allow_credentials(true);
    let cors = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                frontend_url = %state.config.frontend_url,
                "Frontend URL is not a valid origin, cross-origin requests will be rejected"
            );
            cors
        }
    };

    let api = Router::new()
        .route("/auth/csrf-token", get(auth::csrf_token))
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/wallet/{user_id}/transactions",
            get(admin::wallet_transactions),
        )
        .route("/admin/teams/top", get(admin::top_teams))
        .route("/admin/teams/recent", get(admin::recent_teams))
        .route("/analytics/call-logs", post(analytics::call_logs))
        .route("/analytics/contacts", post(analytics::contacts))
        .route("/analytics/export-rate", post(analytics::export_rate))
        .route(
            "/analytics/file-conversion-rate",
            post(analytics::file_conversion_rate),
        )
        .route(
            "/analytics/mindmap-edit-count",
            post(analytics::mindmap_edit_count),
        )
        .route("/analytics/security", post(analytics::security))
        .route("/analytics/user-retention", post(analytics::user_retention))
        .route("/analytics/predictions/churn", get(predictions::churn))
        .route("/analytics/predictions/revenue", get(predictions::revenue))
        .route("/analytics/predictions/usage", get(predictions::usage))
        .route("/dashboards", get(dashboards::list).post(dashboards::save))
        .route("/teams/{id}/api", post(teams::api_action))
        .route("/teams/{id}/audit-logs", post(teams::audit_logs))
        .route("/teams/{id}/users/remove", post(teams::remove_member))
        .route("/usage/daily-tokens", post(usage::daily_tokens))
        .route("/usage/sessions", post(usage::sessions))
        .route("/users/{id}/update", post(users::update))
        .route("/users/{id}/feature-flags", post(users::feature_flags));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}
