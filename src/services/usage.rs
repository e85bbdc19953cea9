//! Usage aggregation over processing jobs: daily token consumption and
//! distinct session counts.

use std::collections::{BTreeMap, HashSet};

use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::ProcessingJob;
use crate::models::range::ResolvedRange;
use crate::store::Store;

/// Optional scoping filters accepted by the usage routes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageScope {
    pub user_id: Option<String>,
    pub workspace_id: Option<String>,
}

/// One day of token consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTokens {
    pub date: String,
    pub tokens: i64,
}

/// One day of distinct sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySessions {
    pub date: String,
    pub sessions: i64,
}

/// Response of `POST /api/usage/sessions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsMetrics {
    pub total_sessions: i64,
    pub by_day: Vec<DailySessions>,
}

/// Fetch the jobs inside the range, optionally scoped to one user or
/// workspace, oldest first.
pub async fn fetch_jobs(
    store: &Store,
    range: &ResolvedRange,
    scope: &UsageScope,
) -> Result<Vec<ProcessingJob>, AppError> {
    let (from, to) = range.bson_bounds();
    let mut filter = doc! { "createdAt": { "$gte": from, "$lt": to } };
    if let Some(user_id) = &scope.user_id {
        filter.insert("userId", user_id.as_str());
    }
    if let Some(workspace_id) = &scope.workspace_id {
        filter.insert("workspaceId", workspace_id.as_str());
    }
    let jobs = store
        .jobs()
        .find(filter)
        .sort(doc! { "createdAt": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(jobs)
}

/// Sum tokens per UTC calendar day, ascending. Days without jobs are
/// omitted.
pub fn reduce_daily_tokens(jobs: &[ProcessingJob]) -> Vec<DailyTokens> {
    let mut days: BTreeMap<String, i64> = BTreeMap::new();
    for job in jobs {
        let day = job
            .created_at
            .to_chrono()
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        *days.entry(day).or_insert(0) += job.tokens_used;
    }
    days.into_iter()
        .map(|(date, tokens)| DailyTokens { date, tokens })
        .collect()
}

/// Count distinct session ids per day and overall.
pub fn reduce_sessions(jobs: &[ProcessingJob]) -> SessionsMetrics {
    let mut days: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    let mut all: HashSet<&str> = HashSet::new();
    for job in jobs {
        let day = job
            .created_at
            .to_chrono()
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        days.entry(day).or_default().insert(&job.session_id);
        all.insert(&job.session_id);
    }
    SessionsMetrics {
        total_sessions: all.len() as i64,
        by_day: days
            .into_iter()
            .map(|(date, sessions)| DailySessions {
                date,
                sessions: sessions.len() as i64,
            })
            .collect(),
    }
}

pub async fn daily_tokens(
    store: &Store,
    range: &ResolvedRange,
    scope: &UsageScope,
) -> Result<Vec<DailyTokens>, AppError> {
    let jobs = fetch_jobs(store, range, scope).await?;
    Ok(reduce_daily_tokens(&jobs))
}

pub async fn sessions(
    store: &Store,
    range: &ResolvedRange,
    scope: &UsageScope,
) -> Result<SessionsMetrics, AppError> {
    let jobs = fetch_jobs(store, range, scope).await?;
    Ok(reduce_sessions(&jobs))
}
