//! User retention metrics: compares the requested window against the
//! window of equal length immediately before it.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::errors::AppError;
use crate::models::event::AnalyticsEvent;
use crate::models::range::ResolvedRange;
use crate::services::analytics::{self, percentage, DailyCount};
use crate::store::Store;

/// Response of `POST /api/analytics/user-retention`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionMetrics {
    pub previous_active_users: i64,
    pub current_active_users: i64,
    pub retained_users: i64,
    pub churned_users: i64,
    pub new_users: i64,
    pub retention_rate: f64,
    pub churn_rate: f64,
    pub daily_active_users: Vec<DailyCount>,
}

pub async fn user_retention(
    store: &Store,
    range: &ResolvedRange,
) -> Result<RetentionMetrics, AppError> {
    let previous_window = range.previous_window();
    let (current, previous) = tokio::try_join!(
        analytics::fetch_all_events(store, range),
        analytics::fetch_all_events(store, &previous_window),
    )?;
    Ok(reduce_retention(&previous, &current))
}

/// An "active user" is any distinct `userId` seen on an event in the
/// window; events without a user are ignored.
pub fn reduce_retention(
    previous: &[AnalyticsEvent],
    current: &[AnalyticsEvent],
) -> RetentionMetrics {
    let previous_users: HashSet<&str> =
        previous.iter().filter_map(|e| e.user_id.as_deref()).collect();
    let current_users: HashSet<&str> =
        current.iter().filter_map(|e| e.user_id.as_deref()).collect();

    let retained = previous_users.intersection(&current_users).count() as i64;
    let previous_active = previous_users.len() as i64;
    let churned = previous_active - retained;
    let new_users = current_users.difference(&previous_users).count() as i64;

    RetentionMetrics {
        previous_active_users: previous_active,
        current_active_users: current_users.len() as i64,
        retained_users: retained,
        churned_users: churned,
        new_users,
        retention_rate: percentage(retained, previous_active),
        churn_rate: percentage(churned, previous_active),
        daily_active_users: daily_active(current),
    }
}

/// Distinct active users per UTC calendar day, ascending.
fn daily_active(events: &[AnalyticsEvent]) -> Vec<DailyCount> {
    let mut days: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    for event in events {
        if let Some(uid) = event.user_id.as_deref() {
            let day = event
                .timestamp
                .to_chrono()
                .date_naive()
                .format("%Y-%m-%d")
                .to_string();
            days.entry(day).or_default().insert(uid);
        }
    }
    days.into_iter()
        .map(|(date, users)| DailyCount {
            date,
            count: users.len() as i64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(date: &str, uid: &str) -> AnalyticsEvent {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        AnalyticsEvent {
            id: uuid::Uuid::new_v4().to_string(),
            kind: "call_log".to_string(),
            event_type: None,
            user_id: Some(uid.to_string()),
            workspace_id: None,
            session_id: None,
            timestamp: bson::DateTime::from_chrono(day.and_hms_opt(12, 0, 0).unwrap().and_utc()),
            metadata: bson::Document::new(),
        }
    }

    #[test]
    fn retention_splits_retained_churned_new() {
        // Previous window: a, b, c. Current window: b, c, d.
        let previous = vec![
            event("2024-01-01", "a"),
            event("2024-01-02", "b"),
            event("2024-01-03", "c"),
        ];
        let current = vec![
            event("2024-01-08", "b"),
            event("2024-01-09", "c"),
            event("2024-01-09", "d"),
            event("2024-01-10", "b"),
        ];
        let metrics = reduce_retention(&previous, &current);
        assert_eq!(metrics.previous_active_users, 3);
        assert_eq!(metrics.current_active_users, 3);
        assert_eq!(metrics.retained_users, 2);
        assert_eq!(metrics.churned_users, 1);
        assert_eq!(metrics.new_users, 1);
        assert_eq!(metrics.retention_rate, 66.67);
        assert_eq!(metrics.churn_rate, 33.33);
    }

    #[test]
    fn rates_are_zero_with_no_previous_users() {
        let current = vec![event("2024-01-08", "a")];
        let metrics = reduce_retention(&[], &current);
        assert_eq!(metrics.previous_active_users, 0);
        assert_eq!(metrics.retention_rate, 0.0);
        assert_eq!(metrics.churn_rate, 0.0);
        assert_eq!(metrics.new_users, 1);
    }

    #[test]
    fn daily_active_users_deduplicates_within_a_day() {
        let current = vec![
            event("2024-01-08", "a"),
            event("2024-01-08", "a"),
            event("2024-01-08", "b"),
            event("2024-01-09", "a"),
        ];
        let metrics = reduce_retention(&[], &current);
        assert_eq!(
            metrics.daily_active_users,
            vec![
                DailyCount { date: "2024-01-08".into(), count: 2 },
                DailyCount { date: "2024-01-09".into(), count: 1 },
            ]
        );
    }
}
