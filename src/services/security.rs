//! Security overview metrics: auth events, incidents, deletion requests.

use std::collections::BTreeMap;

use mongodb::bson::doc;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::event::{kinds, AnalyticsEvent};
use crate::models::range::ResolvedRange;
use crate::services::analytics::{self, daily_series, group_count, DailyCount};
use crate::store::Store;

/// Event subtype recorded for failed login attempts.
const LOGIN_FAILED: &str = "login_failed";

/// Response of `POST /api/analytics/security`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    pub total_security_events: i64,
    pub failed_logins: i64,
    pub by_event_type: BTreeMap<String, i64>,
    pub by_day: Vec<DailyCount>,
    pub open_incidents: i64,
    pub resolved_incidents: i64,
    pub pending_deletion_requests: i64,
    pub completed_deletion_requests: i64,
}

/// Fetch all security inputs in parallel and reduce them.
pub async fn overview(store: &Store, range: &ResolvedRange) -> Result<SecurityMetrics, AppError> {
    let (events, open, resolved, pending, completed) = tokio::try_join!(
        analytics::fetch_events(store, kinds::SECURITY, range),
        count_incidents(store, "open"),
        count_incidents(store, "resolved"),
        count_deletion_requests(store, "pending"),
        count_deletion_requests(store, "completed"),
    )?;

    let mut metrics = reduce_events(&events);
    metrics.open_incidents = open;
    metrics.resolved_incidents = resolved;
    metrics.pending_deletion_requests = pending;
    metrics.completed_deletion_requests = completed;
    Ok(metrics)
}

/// Reduce the in-range security events; incident and deletion counters are
/// filled in by the caller.
pub fn reduce_events(events: &[AnalyticsEvent]) -> SecurityMetrics {
    let failed_logins = events
        .iter()
        .filter(|e| e.event_type.as_deref() == Some(LOGIN_FAILED))
        .count() as i64;
    SecurityMetrics {
        total_security_events: events.len() as i64,
        failed_logins,
        by_event_type: group_count(events.iter().map(|e| e.event_type.as_deref())),
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
        open_incidents: 0,
        resolved_incidents: 0,
        pending_deletion_requests: 0,
        completed_deletion_requests: 0,
    }
}

async fn count_incidents(store: &Store, status: &str) -> Result<i64, AppError> {
    Ok(store
        .incidents()
        .count_documents(doc! { "status": status })
        .await? as i64)
}

async fn count_deletion_requests(store: &Store, status: &str) -> Result<i64, AppError> {
    Ok(store
        .deletion_requests()
        .count_documents(doc! { "status": status })
        .await? as i64)
}
