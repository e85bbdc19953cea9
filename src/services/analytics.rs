//! Analytics aggregation: shared reducers and the per-route metric
//! computations over `analyticsEvents`.
//!
//! Every aggregation here follows the same shape: fetch the time-filtered
//! events, then reduce them with pure functions so the arithmetic is
//! testable without a store.

use std::collections::BTreeMap;

use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::event::{kinds, AnalyticsEvent};
use crate::models::range::ResolvedRange;
use crate::store::Store;

/// Grouping key used when the underlying field is absent.
pub const UNKNOWN_KEY: &str = "unknown";

/// Round to two decimal places, half up.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator` as a percentage in `[0, 100]`, two decimals.
/// A zero denominator yields 0 rather than NaN.
pub fn percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64 * 100.0)
}

/// Tally one count per key; absent keys group under [`UNKNOWN_KEY`].
pub fn group_count<'a, I>(keys: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts
            .entry(key.unwrap_or(UNKNOWN_KEY).to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// One point in a daily time series. Dates are UTC calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// Count items per UTC calendar day, ascending. Days without items are
/// omitted.
pub fn daily_series<I>(timestamps: I) -> Vec<DailyCount>
where
    I: IntoIterator<Item = bson::DateTime>,
{
    let mut days: BTreeMap<String, i64> = BTreeMap::new();
    for ts in timestamps {
        let day = ts.to_chrono().date_naive().format("%Y-%m-%d").to_string();
        *days.entry(day).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Sum values per UTC calendar day, ascending.
pub fn daily_sum<I>(entries: I) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = (bson::DateTime, i64)>,
{
    let mut days: BTreeMap<String, i64> = BTreeMap::new();
    for (ts, value) in entries {
        let day = ts.to_chrono().date_naive().format("%Y-%m-%d").to_string();
        *days.entry(day).or_insert(0) += value;
    }
    days.into_iter().collect()
}

/// Fetch all events of one kind inside the range, oldest first.
pub async fn fetch_events(
    store: &Store,
    kind: &str,
    range: &ResolvedRange,
) -> Result<Vec<AnalyticsEvent>, AppError> {
    let (from, to) = range.bson_bounds();
    let events = store
        .events()
        .find(doc! { "type": kind, "timestamp": { "$gte": from, "$lt": to } })
        .sort(doc! { "timestamp": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(events)
}

/// Fetch every event inside the range regardless of kind, oldest first.
pub async fn fetch_all_events(
    store: &Store,
    range: &ResolvedRange,
) -> Result<Vec<AnalyticsEvent>, AppError> {
    let (from, to) = range.bson_bounds();
    let events = store
        .events()
        .find(doc! { "timestamp": { "$gte": from, "$lt": to } })
        .sort(doc! { "timestamp": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(events)
}

/// Metrics for `POST /api/analytics/call-logs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogMetrics {
    pub total_calls: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_day: Vec<DailyCount>,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
}

pub fn reduce_call_logs(events: &[AnalyticsEvent]) -> CallLogMetrics {
    let total_calls = events.len() as i64;
    let total_duration: f64 = events
        .iter()
        .filter_map(|e| e.meta_number("durationSeconds"))
        .sum();
    CallLogMetrics {
        total_calls,
        by_status: group_count(events.iter().map(|e| e.event_type.as_deref())),
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
        total_duration_seconds: round2(total_duration),
        average_duration_seconds: if total_calls == 0 {
            0.0
        } else {
            round2(total_duration / total_calls as f64)
        },
    }
}

pub async fn call_logs(store: &Store, range: &ResolvedRange) -> Result<CallLogMetrics, AppError> {
    let events = fetch_events(store, kinds::CALL_LOG, range).await?;
    Ok(reduce_call_logs(&events))
}

/// Metrics for `POST /api/analytics/contacts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMetrics {
    pub total_contacts: i64,
    pub by_source: BTreeMap<String, i64>,
    pub by_day: Vec<DailyCount>,
}

pub fn reduce_contacts(events: &[AnalyticsEvent]) -> ContactMetrics {
    ContactMetrics {
        total_contacts: events.len() as i64,
        by_source: group_count(events.iter().map(|e| e.meta_str("source"))),
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
    }
}

pub async fn contacts(store: &Store, range: &ResolvedRange) -> Result<ContactMetrics, AppError> {
    let events = fetch_events(store, kinds::CONTACT, range).await?;
    Ok(reduce_contacts(&events))
}

/// Metrics for `POST /api/analytics/export-rate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetrics {
    pub total_exports: i64,
    pub successful_exports: i64,
    pub failed_exports: i64,
    pub success_rate: f64,
    pub by_format: BTreeMap<String, i64>,
    pub by_day: Vec<DailyCount>,
}

pub fn reduce_exports(events: &[AnalyticsEvent]) -> ExportMetrics {
    let total = events.len() as i64;
    // Events without a boolean success flag count as failed.
    let successful = events
        .iter()
        .filter(|e| e.meta_bool("success") == Some(true))
        .count() as i64;
    ExportMetrics {
        total_exports: total,
        successful_exports: successful,
        failed_exports: total - successful,
        success_rate: percentage(successful, total),
        by_format: group_count(events.iter().map(|e| e.meta_str("format"))),
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
    }
}

pub async fn export_rate(store: &Store, range: &ResolvedRange) -> Result<ExportMetrics, AppError> {
    let events = fetch_events(store, kinds::EXPORT, range).await?;
    Ok(reduce_exports(&events))
}

/// Metrics for `POST /api/analytics/file-conversion-rate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMetrics {
    pub total_conversions: i64,
    pub successful_conversions: i64,
    pub failed_conversions: i64,
    pub success_rate: f64,
    pub by_day: Vec<DailyCount>,
}

pub fn reduce_conversions(events: &[AnalyticsEvent]) -> ConversionMetrics {
    let total = events.len() as i64;
    let successful = events
        .iter()
        .filter(|e| e.meta_bool("success") == Some(true))
        .count() as i64;
    ConversionMetrics {
        total_conversions: total,
        successful_conversions: successful,
        failed_conversions: total - successful,
        success_rate: percentage(successful, total),
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
    }
}

pub async fn file_conversion_rate(
    store: &Store,
    range: &ResolvedRange,
) -> Result<ConversionMetrics, AppError> {
    let events = fetch_events(store, kinds::FILE_CONVERSION, range).await?;
    Ok(reduce_conversions(&events))
}

/// Metrics for `POST /api/analytics/mindmap-edit-count`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapEditMetrics {
    pub total_edits: i64,
    pub by_day: Vec<DailyCount>,
    pub by_mindmap: BTreeMap<String, i64>,
    pub total_mindmaps: i64,
    pub average_edits_per_mindmap: f64,
}

pub fn reduce_mindmap_edits(events: &[AnalyticsEvent], total_mindmaps: i64) -> MindmapEditMetrics {
    let total_edits = events.len() as i64;
    MindmapEditMetrics {
        total_edits,
        by_day: daily_series(events.iter().map(|e| e.timestamp)),
        by_mindmap: group_count(events.iter().map(|e| e.meta_str("mindmapId"))),
        total_mindmaps,
        average_edits_per_mindmap: if total_mindmaps == 0 {
            0.0
        } else {
            round2(total_edits as f64 / total_mindmaps as f64)
        },
    }
}

pub async fn mindmap_edit_count(
    store: &Store,
    range: &ResolvedRange,
) -> Result<MindmapEditMetrics, AppError> {
    let (events, total_mindmaps) = tokio::try_join!(
        fetch_events(store, kinds::MINDMAP_EDIT, range),
        count_mindmaps(store),
    )?;
    Ok(reduce_mindmap_edits(&events, total_mindmaps))
}

async fn count_mindmaps(store: &Store) -> Result<i64, AppError> {
    Ok(store.mindmaps().count_documents(doc! {}).await? as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::NaiveDate;

    fn at(date: &str, hour: u32) -> bson::DateTime {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        bson::DateTime::from_chrono(day.and_hms_opt(hour, 0, 0).unwrap().and_utc())
    }

    fn event(date: &str, hour: u32, metadata: bson::Document) -> AnalyticsEvent {
        AnalyticsEvent {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kinds::EXPORT.to_string(),
            event_type: None,
            user_id: None,
            workspace_id: None,
            session_id: None,
            timestamp: at(date, hour),
            metadata,
        }
    }

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(round2(66.664), 66.66);
        assert_eq!(round2(0.005), 0.01);
    }

    #[test]
    fn percentage_handles_zero_denominator() {
        assert_eq!(percentage(7, 0), 0.0);
        assert_eq!(percentage(0, 10), 0.0);
        assert_eq!(percentage(7, 10), 70.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn percentage_stays_in_bounds() {
        for numerator in 0..=10 {
            let p = percentage(numerator, 10);
            assert!((0.0..=100.0).contains(&p));
        }
    }

    #[test]
    fn group_count_uses_unknown_for_absent_keys() {
        let counts = group_count(vec![Some("pdf"), Some("csv"), Some("pdf"), None]);
        assert_eq!(counts["pdf"], 2);
        assert_eq!(counts["csv"], 1);
        assert_eq!(counts[UNKNOWN_KEY], 1);
        // Grouped counts must sum to the document count.
        assert_eq!(counts.values().sum::<i64>(), 4);
    }

    #[test]
    fn daily_series_is_ascending_and_within_range() {
        let series = daily_series(vec![
            at("2024-01-03", 9),
            at("2024-01-01", 12),
            at("2024-01-01", 23),
            at("2024-01-02", 0),
        ]);
        assert_eq!(
            series,
            vec![
                DailyCount { date: "2024-01-01".into(), count: 2 },
                DailyCount { date: "2024-01-02".into(), count: 1 },
                DailyCount { date: "2024-01-03".into(), count: 1 },
            ]
        );
        let dates: Vec<_> = series.iter().map(|d| d.date.as_str()).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn conversion_rate_example() {
        // 10 file_conversion events, 7 successful, 3 failed.
        let mut events = Vec::new();
        for i in 0..10 {
            events.push(event("2024-02-01", i, doc! { "success": i < 7 }));
        }
        let metrics = reduce_conversions(&events);
        assert_eq!(metrics.total_conversions, 10);
        assert_eq!(metrics.successful_conversions, 7);
        assert_eq!(metrics.failed_conversions, 3);
        assert_eq!(metrics.success_rate, 70.0);
    }

    #[test]
    fn conversions_without_success_flag_count_as_failed() {
        let events = vec![
            event("2024-02-01", 1, doc! { "success": true }),
            event("2024-02-01", 2, doc! {}),
        ];
        let metrics = reduce_conversions(&events);
        assert_eq!(metrics.total_conversions, 2);
        assert_eq!(metrics.successful_conversions, 1);
        assert_eq!(metrics.failed_conversions, 1);
        assert_eq!(metrics.success_rate, 50.0);
    }

    #[test]
    fn empty_range_yields_zeroed_metrics() {
        let metrics = reduce_exports(&[]);
        assert_eq!(metrics.total_exports, 0);
        assert_eq!(metrics.success_rate, 0.0);
        assert!(metrics.by_day.is_empty());
        assert!(metrics.by_format.is_empty());
    }

    #[test]
    fn export_formats_group_with_unknown() {
        let events = vec![
            event("2024-02-01", 1, doc! { "format": "pdf", "success": true }),
            event("2024-02-01", 2, doc! { "format": "pdf", "success": false }),
            event("2024-02-02", 3, doc! { "success": true }),
        ];
        let metrics = reduce_exports(&events);
        assert_eq!(metrics.by_format["pdf"], 2);
        assert_eq!(metrics.by_format[UNKNOWN_KEY], 1);
        assert_eq!(metrics.by_format.values().sum::<i64>(), metrics.total_exports);
    }

    #[test]
    fn call_log_durations_average() {
        let mut completed = event("2024-03-01", 9, doc! { "durationSeconds": 120_i64 });
        completed.event_type = Some("completed".to_string());
        let mut missed = event("2024-03-01", 10, doc! {});
        missed.event_type = Some("missed".to_string());
        let mut long = event("2024-03-02", 11, doc! { "durationSeconds": 60_i32 });
        long.event_type = Some("completed".to_string());

        let metrics = reduce_call_logs(&[completed, missed, long]);
        assert_eq!(metrics.total_calls, 3);
        assert_eq!(metrics.by_status["completed"], 2);
        assert_eq!(metrics.by_status["missed"], 1);
        assert_eq!(metrics.total_duration_seconds, 180.0);
        assert_eq!(metrics.average_duration_seconds, 60.0);
    }

    #[test]
    fn mindmap_edits_average_over_collection_size() {
        let events = vec![
            event("2024-03-01", 9, doc! { "mindmapId": "m1" }),
            event("2024-03-01", 10, doc! { "mindmapId": "m1" }),
            event("2024-03-02", 11, doc! { "mindmapId": "m2" }),
        ];
        let metrics = reduce_mindmap_edits(&events, 4);
        assert_eq!(metrics.total_edits, 3);
        assert_eq!(metrics.by_mindmap["m1"], 2);
        assert_eq!(metrics.total_mindmaps, 4);
        assert_eq!(metrics.average_edits_per_mindmap, 0.75);

        let empty = reduce_mindmap_edits(&[], 0);
        assert_eq!(empty.average_edits_per_mindmap, 0.0);
    }

    #[test]
    fn daily_sum_accumulates_per_day() {
        let sums = daily_sum(vec![
            (at("2024-01-01", 9), 100),
            (at("2024-01-01", 18), 50),
            (at("2024-01-02", 9), 10),
            (at("2024-01-02", 10), 10),
        ]);
        assert_eq!(
            sums,
            vec![
                ("2024-01-01".to_string(), 150),
                ("2024-01-02".to_string(), 20),
            ]
        );
    }
}
