//! Admin routes: user listing, wallet ledgers, workspace rankings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::billing::TransactionResponse;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::range::DateRange;
use crate::models::user::UserResponse;
use crate::services::teams::{self, RecentTeamsReport, TopTeamsReport};
use crate::services::users::{self, UserFilters};
use crate::services::wallet;
use crate::AppState;

/// GET /api/admin/users — paged user listing with filters.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<UserFilters>,
) -> Result<Json<ApiResponse<PagedResult<UserResponse>>>, AppError> {
    let result = users::list(&state.store, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/admin/wallet/{userId}/transactions — paged credit ledger,
/// newest first.
pub async fn wallet_transactions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PagedResult<TransactionResponse>>>, AppError> {
    let result = wallet::transactions(&state.store, &user_id, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// Query params of GET /api/admin/teams/top.
#[derive(Debug, Deserialize)]
pub struct TopTeamsQuery {
    pub start: String,
    pub end: String,
    pub limit: Option<usize>,
}

/// GET /api/admin/teams/top — workspaces ranked by tokens in range.
pub async fn top_teams(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<TopTeamsQuery>,
) -> Result<Json<ApiResponse<TopTeamsReport>>, AppError> {
    let range = DateRange {
        start: query.start,
        end: query.end,
    }
    .parse()?;
    let report = teams::top_by_tokens(&state.store, &range, query.limit.unwrap_or(10)).await?;
    Ok(ApiResponse::success(report))
}

/// Query params of GET /api/admin/teams/recent.
#[derive(Debug, Deserialize)]
pub struct RecentTeamsQuery {
    pub limit: Option<usize>,
}

/// GET /api/admin/teams/recent — most recently created workspaces.
pub async fn recent_teams(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<RecentTeamsQuery>,
) -> Result<Json<ApiResponse<RecentTeamsReport>>, AppError> {
    let report = teams::recent(&state.store, query.limit.unwrap_or(10)).await?;
    Ok(ApiResponse::success(report))
}
