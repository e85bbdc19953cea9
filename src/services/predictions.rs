//! Churn risk scoring and linear usage/revenue forecasting.
//!
//! Churn uses a 4-factor weighted model (each factor scored 0-100, higher
//! means more likely to churn):
//! - Recency: 35% — days since the user was last active.
//! - Frequency: 25% — processing jobs in the trailing 30 days.
//! - Usage trend: 25% — tokens in the recent half of the window vs the
//!   prior half.
//! - Plan: 15% — free plans churn more than paid ones.
//!
//! Forecasts are an ordinary least-squares line over the history, clamped
//! at zero.

use chrono::{Datelike, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;
use std::collections::HashMap;

use crate::errors::AppError;
use crate::models::job::ProcessingJob;
use crate::models::range::ResolvedRange;
use crate::models::user::User;
use crate::services::analytics::round2;
use crate::store::Store;

/// Trailing window, in days, that feeds churn and usage forecasts.
const HISTORY_DAYS: i64 = 30;

/// Factor weights for the churn score.
#[derive(Debug, Clone)]
pub struct ChurnWeights {
    pub recency: f64,
    pub frequency: f64,
    pub usage_trend: f64,
    pub plan: f64,
}

impl Default for ChurnWeights {
    fn default() -> Self {
        Self {
            recency: 0.35,
            frequency: 0.25,
            usage_trend: 0.25,
            plan: 0.15,
        }
    }
}

/// Per-user inputs to the churn model.
#[derive(Debug, Clone, Default)]
pub struct ChurnInputs {
    /// Days since `lastActiveAt`; `None` when the user was never active.
    pub days_since_active: Option<i64>,
    pub jobs_last_30_days: i64,
    /// Tokens consumed in the recent half of the trailing window.
    pub tokens_recent: i64,
    /// Tokens consumed in the prior half of the trailing window.
    pub tokens_prior: i64,
    pub plan: String,
}

/// Individual factor scores, 0-100 each.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnFactorScores {
    pub recency: f64,
    pub frequency: f64,
    pub usage_trend: f64,
    pub plan: f64,
}

/// Risk bucket derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChurnRiskLevel {
    Low,
    Medium,
    High,
}

impl ChurnRiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            Self::Low
        } else if score < 70.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// One churn prediction, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnPrediction {
    pub user_id: String,
    pub email: String,
    pub score: f64,
    pub risk_level: ChurnRiskLevel,
    pub factors: ChurnFactorScores,
}

/// Score the individual factors.
pub fn churn_factors(inputs: &ChurnInputs) -> ChurnFactorScores {
    ChurnFactorScores {
        recency: recency_score(inputs.days_since_active),
        frequency: frequency_score(inputs.jobs_last_30_days),
        usage_trend: trend_score(inputs.tokens_recent, inputs.tokens_prior),
        plan: plan_score(&inputs.plan),
    }
}

/// Composite weighted churn score, 0-100, two decimals.
pub fn churn_score(factors: &ChurnFactorScores, weights: &ChurnWeights) -> f64 {
    round2(
        factors.recency * weights.recency
            + factors.frequency * weights.frequency
            + factors.usage_trend * weights.usage_trend
            + factors.plan * weights.plan,
    )
}

/// Never-active users score 100; 30+ days inactive saturates at 100.
fn recency_score(days_since_active: Option<i64>) -> f64 {
    match days_since_active {
        None => 100.0,
        Some(days) => (days.clamp(0, HISTORY_DAYS) as f64 / HISTORY_DAYS as f64) * 100.0,
    }
}

/// 0 jobs scores 100; 20+ jobs in the window scores 0.
fn frequency_score(jobs: i64) -> f64 {
    (1.0 - jobs.clamp(0, 20) as f64 / 20.0) * 100.0
}

/// Declining token usage raises the score; growth drops it to 0.
fn trend_score(recent: i64, prior: i64) -> f64 {
    if prior == 0 {
        return if recent > 0 { 0.0 } else { 100.0 };
    }
    let ratio = recent as f64 / prior as f64;
    if ratio >= 1.0 {
        0.0
    } else {
        (1.0 - ratio) * 100.0
    }
}

fn plan_score(plan: &str) -> f64 {
    match plan {
        "free" => 100.0,
        "starter" => 70.0,
        "pro" => 40.0,
        "enterprise" => 10.0,
        _ => 60.0,
    }
}

/// Compute churn predictions for one user or the whole user base, highest
/// score first, truncated to `limit`.
pub async fn churn(
    store: &Store,
    user_id: Option<&str>,
    limit: usize,
) -> Result<Vec<ChurnPrediction>, AppError> {
    let users: Vec<User> = match user_id {
        Some(id) => store
            .users()
            .find_one(doc! { "_id": id })
            .await?
            .map(|u| vec![u])
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?,
        None => {
            store
                .users()
                .find(doc! {})
                .await?
                .try_collect()
                .await?
        }
    };

    let today = Utc::now().date_naive();
    let window = ResolvedRange::trailing(today, HISTORY_DAYS);
    let jobs = crate::services::usage::fetch_jobs(store, &window, &Default::default()).await?;
    let half_split = ResolvedRange::trailing(today, HISTORY_DAYS / 2);

    // Per-user job counts and half-window token splits.
    let mut job_counts: HashMap<&str, i64> = HashMap::new();
    let mut recent_tokens: HashMap<&str, i64> = HashMap::new();
    let mut prior_tokens: HashMap<&str, i64> = HashMap::new();
    for job in &jobs {
        *job_counts.entry(&job.user_id).or_insert(0) += 1;
        let bucket = if half_split.contains(job.created_at) {
            &mut recent_tokens
        } else {
            &mut prior_tokens
        };
        *bucket.entry(&job.user_id).or_insert(0) += job.tokens_used;
    }

    let weights = ChurnWeights::default();
    let mut predictions: Vec<ChurnPrediction> = users
        .into_iter()
        .map(|user| {
            let inputs = ChurnInputs {
                days_since_active: user
                    .last_active_at
                    .map(|t| (today - t.to_chrono().date_naive()).num_days()),
                jobs_last_30_days: job_counts.get(user.id.as_str()).copied().unwrap_or(0),
                tokens_recent: recent_tokens.get(user.id.as_str()).copied().unwrap_or(0),
                tokens_prior: prior_tokens.get(user.id.as_str()).copied().unwrap_or(0),
                plan: user.plan.clone(),
            };
            let factors = churn_factors(&inputs);
            let score = churn_score(&factors, &weights);
            ChurnPrediction {
                user_id: user.id,
                email: user.email,
                score,
                risk_level: ChurnRiskLevel::from_score(score),
                factors,
            }
        })
        .collect();

    predictions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    predictions.truncate(limit.max(1));
    Ok(predictions)
}

/// Ordinary least-squares fit of `values` against their indices,
/// returning `(slope, intercept)`. Degenerate inputs fit a flat line.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }
    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..n).map(|i| (i * i) as f64).sum();

    let denominator = n_f * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return (0.0, sum_y / n_f);
    }
    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;
    (slope, intercept)
}

/// One month of revenue, historical or projected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: f64,
    pub projected: bool,
}

/// Extend the monthly history with `period` projected months.
pub fn project_revenue(history: Vec<(String, f64)>, period: usize) -> Vec<MonthlyRevenue> {
    let values: Vec<f64> = history.iter().map(|(_, v)| *v).collect();
    let (slope, intercept) = linear_fit(&values);

    let mut out: Vec<MonthlyRevenue> = history
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue {
            month,
            revenue: round2(revenue),
            projected: false,
        })
        .collect();

    let mut month = out
        .last()
        .map(|m| m.month.clone())
        .unwrap_or_else(|| Utc::now().format("%Y-%m").to_string());
    let n = values.len();
    for i in 0..period {
        month = next_month(&month);
        let fitted = slope * (n + i) as f64 + intercept;
        out.push(MonthlyRevenue {
            month: month.clone(),
            revenue: round2(fitted.max(0.0)),
            projected: true,
        });
    }
    out
}

/// Advance a `YYYY-MM` label by one month.
fn next_month(month: &str) -> String {
    let (year, m) = month
        .split_once('-')
        .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
        .unwrap_or_else(|| (Utc::now().year(), Utc::now().month()));
    if m >= 12 {
        format!("{:04}-01", year + 1)
    } else {
        format!("{year:04}-{:02}", m + 1)
    }
}

/// Monthly revenue history plus `period` months of projection.
pub async fn revenue(store: &Store, period: usize) -> Result<Vec<MonthlyRevenue>, AppError> {
    let payments = store
        .payments()
        .find(doc! { "status": "succeeded" })
        .sort(doc! { "createdAt": 1 })
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    let mut months: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();
    for payment in &payments {
        let month = payment
            .created_at
            .to_chrono()
            .format("%Y-%m")
            .to_string();
        *months.entry(month).or_insert(0.0) += payment.amount_usd;
    }

    Ok(project_revenue(months.into_iter().collect(), period))
}

/// Which job metric a usage forecast tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ForecastMetric {
    Tokens,
    Sessions,
}

impl ForecastMetric {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "tokens" => Ok(Self::Tokens),
            "sessions" => Ok(Self::Sessions),
            other => Err(AppError::validation(format!(
                "metric must be 'tokens' or 'sessions', got '{other}'"
            ))),
        }
    }
}

/// One day of a usage forecast, historical or projected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePoint {
    pub date: String,
    pub value: f64,
    pub projected: bool,
}

/// Extend a gap-free daily history with `period` projected days.
pub fn project_daily(history: Vec<(String, f64)>, period: i64) -> Vec<UsagePoint> {
    let values: Vec<f64> = history.iter().map(|(_, v)| *v).collect();
    let (slope, intercept) = linear_fit(&values);

    let last_date = history
        .last()
        .and_then(|(d, _)| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut out: Vec<UsagePoint> = history
        .into_iter()
        .map(|(date, value)| UsagePoint {
            date,
            value,
            projected: false,
        })
        .collect();

    let n = values.len();
    for i in 0..period.max(0) {
        let fitted = slope * (n as i64 + i) as f64 + intercept;
        out.push(UsagePoint {
            date: (last_date + chrono::Duration::days(i + 1))
                .format("%Y-%m-%d")
                .to_string(),
            value: round2(fitted.max(0.0)),
            projected: true,
        });
    }
    out
}

/// Daily history of the metric over the trailing 30 days, zero-filled,
/// plus `period` days of projection.
pub async fn usage_forecast(
    store: &Store,
    metric: ForecastMetric,
    period: i64,
) -> Result<Vec<UsagePoint>, AppError> {
    let today = Utc::now().date_naive();
    let window = ResolvedRange::trailing(today, HISTORY_DAYS);
    let jobs = crate::services::usage::fetch_jobs(store, &window, &Default::default()).await?;

    let history = daily_values(&jobs, &window, metric);
    Ok(project_daily(history, period))
}

/// Per-day metric values across the whole window. Zero-filled so the fit
/// sees evenly spaced samples.
fn daily_values(
    jobs: &[ProcessingJob],
    window: &ResolvedRange,
    metric: ForecastMetric,
) -> Vec<(String, f64)> {
    let mut out = Vec::with_capacity(window.days() as usize);
    let mut day = window.start;
    while day <= window.end {
        let label = day.format("%Y-%m-%d").to_string();
        let value = match metric {
            ForecastMetric::Tokens => jobs
                .iter()
                .filter(|j| j.created_at.to_chrono().date_naive() == day)
                .map(|j| j.tokens_used)
                .sum::<i64>() as f64,
            ForecastMetric::Sessions => jobs
                .iter()
                .filter(|j| j.created_at.to_chrono().date_naive() == day)
                .map(|j| j.session_id.as_str())
                .collect::<std::collections::HashSet<_>>()
                .len() as f64,
        };
        out.push((label, value));
        day += chrono::Duration::days(1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recency_saturates_at_thirty_days() {
        assert_eq!(recency_score(None), 100.0);
        assert_eq!(recency_score(Some(0)), 0.0);
        assert_eq!(recency_score(Some(15)), 50.0);
        assert_eq!(recency_score(Some(45)), 100.0);
    }

    #[test]
    fn frequency_inverts_job_count() {
        assert_eq!(frequency_score(0), 100.0);
        assert_eq!(frequency_score(10), 50.0);
        assert_eq!(frequency_score(20), 0.0);
        assert_eq!(frequency_score(50), 0.0);
    }

    #[test]
    fn trend_rewards_growth_and_flags_decline() {
        assert_eq!(trend_score(100, 100), 0.0);
        assert_eq!(trend_score(200, 100), 0.0);
        assert_eq!(trend_score(50, 100), 50.0);
        assert_eq!(trend_score(0, 100), 100.0);
        assert_eq!(trend_score(0, 0), 100.0);
        assert_eq!(trend_score(10, 0), 0.0);
    }

    #[test]
    fn churn_score_worked_example() {
        // Recency 15d -> 50, frequency 10 jobs -> 50, trend 50/100 -> 50,
        // plan free -> 100.
        // 50*0.35 + 50*0.25 + 50*0.25 + 100*0.15 = 17.5 + 12.5 + 12.5 + 15 = 57.5
        let inputs = ChurnInputs {
            days_since_active: Some(15),
            jobs_last_30_days: 10,
            tokens_recent: 50,
            tokens_prior: 100,
            plan: "free".to_string(),
        };
        let factors = churn_factors(&inputs);
        let score = churn_score(&factors, &ChurnWeights::default());
        assert_eq!(score, 57.5);
        assert_eq!(ChurnRiskLevel::from_score(score), ChurnRiskLevel::Medium);
    }

    #[test]
    fn risk_level_boundaries() {
        assert_eq!(ChurnRiskLevel::from_score(0.0), ChurnRiskLevel::Low);
        assert_eq!(ChurnRiskLevel::from_score(39.99), ChurnRiskLevel::Low);
        assert_eq!(ChurnRiskLevel::from_score(40.0), ChurnRiskLevel::Medium);
        assert_eq!(ChurnRiskLevel::from_score(70.0), ChurnRiskLevel::High);
        assert_eq!(ChurnRiskLevel::from_score(100.0), ChurnRiskLevel::High);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        // y = 2x + 1
        let (slope, intercept) = linear_fit(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_degenerate_inputs() {
        assert_eq!(linear_fit(&[]), (0.0, 0.0));
        assert_eq!(linear_fit(&[5.0]), (0.0, 5.0));
        let (slope, intercept) = linear_fit(&[4.0, 4.0, 4.0]);
        assert!((slope).abs() < 1e-9);
        assert!((intercept - 4.0).abs() < 1e-9);
    }

    #[test]
    fn revenue_projection_extends_history() {
        let history = vec![
            ("2024-01".to_string(), 100.0),
            ("2024-02".to_string(), 200.0),
            ("2024-03".to_string(), 300.0),
        ];
        let out = project_revenue(history, 2);
        assert_eq!(out.len(), 5);
        assert!(!out[2].projected);
        assert!(out[3].projected);
        assert_eq!(out[3].month, "2024-04");
        assert_eq!(out[3].revenue, 400.0);
        assert_eq!(out[4].month, "2024-05");
        assert_eq!(out[4].revenue, 500.0);
    }

    #[test]
    fn month_label_rolls_over_years() {
        assert_eq!(next_month("2024-11"), "2024-12");
        assert_eq!(next_month("2024-12"), "2025-01");
    }

    #[test]
    fn projection_clamps_below_zero() {
        let history = vec![
            ("2024-01".to_string(), 300.0),
            ("2024-02".to_string(), 100.0),
        ];
        // Slope -200/month; the second projected month would go negative.
        let out = project_revenue(history, 2);
        assert_eq!(out[2].revenue, 0.0);
        assert_eq!(out[3].revenue, 0.0);
    }

    #[test]
    fn daily_projection_dates_follow_history() {
        let history = vec![
            ("2024-05-29".to_string(), 10.0),
            ("2024-05-30".to_string(), 20.0),
        ];
        let out = project_daily(history, 2);
        assert_eq!(out[2].date, "2024-05-31");
        assert_eq!(out[3].date, "2024-06-01");
        assert!(out[2].projected && out[3].projected);
        assert_eq!(out[2].value, 30.0);
    }

    #[test]
    fn metric_parse_rejects_unknown() {
        assert_eq!(ForecastMetric::parse("tokens").unwrap(), ForecastMetric::Tokens);
        assert_eq!(ForecastMetric::parse("sessions").unwrap(), ForecastMetric::Sessions);
        assert!(ForecastMetric::parse("calls").is_err());
    }
}
