//! Workspace (team) administration: usage rankings, API key and webhook
//! management, audit log queries, membership removal.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::audit::{AuditLog, AuditLogResponse};
use crate::models::job::ProcessingJob;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::range::{DateRange, ResolvedRange};
use crate::models::workspace::{
    ApiKey, ApiKeyResponse, RemoveMemberRequest, TeamApiAction, WebhookEndpoint, Workspace,
    WorkspaceSummary,
};
use crate::services::audit;
use crate::store::{self, QueryPlan, Store};

/// One workspace in the top-by-tokens ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTeam {
    pub workspace_id: String,
    pub name: String,
    pub plan: String,
    pub tokens_used: i64,
    pub job_count: i64,
}

/// Response of `GET /api/admin/teams/top`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTeamsReport {
    pub teams: Vec<TopTeam>,
    pub query_plan: QueryPlan,
}

/// Scan-path predicate for the job ranking. Must accept exactly the jobs
/// the server-side `createdAt` range filter would return.
fn job_in_range(job: &ProcessingJob, range: &ResolvedRange) -> bool {
    range.contains(job.created_at)
}

/// Scan-path predicate for the audit log query. Must accept exactly the
/// entries the server-side workspace/date/action filter would return.
fn audit_log_matches(
    log: &AuditLog,
    workspace_id: &str,
    range: Option<&ResolvedRange>,
    action: Option<&str>,
) -> bool {
    log.workspace_id.as_deref() == Some(workspace_id)
        && range.map_or(true, |r| r.contains(log.created_at))
        && action.map_or(true, |a| log.action == a)
}

/// Rank workspaces by tokens consumed inside the range. The job query
/// needs a composite index on `(workspaceId, createdAt)`; without it the
/// store layer degrades to a scan that re-applies the range filter, so
/// the ranking stays range-correct either way.
pub async fn top_by_tokens(
    store: &Store,
    range: &ResolvedRange,
    limit: usize,
) -> Result<TopTeamsReport, AppError> {
    let (from, to) = range.bson_bounds();
    let (jobs, query_plan) = store::find_indexed_or_scan(
        &store.jobs(),
        doc! { "createdAt": { "$gte": from, "$lt": to } },
        doc! { "createdAt": 1 },
        |job| job_in_range(job, range),
        |a, b| a.created_at.cmp(&b.created_at),
    )
    .await?;

    // Group tokens per workspace in memory.
    let mut tokens: HashMap<String, (i64, i64)> = HashMap::new();
    for job in &jobs {
        let key = job
            .workspace_id
            .clone()
            .unwrap_or_else(|| crate::services::analytics::UNKNOWN_KEY.to_string());
        let entry = tokens.entry(key).or_insert((0, 0));
        entry.0 += job.tokens_used;
        entry.1 += 1;
    }

    let ids: Vec<&str> = tokens.keys().map(String::as_str).collect();
    let workspaces: Vec<Workspace> = store
        .workspaces()
        .find(doc! { "_id": { "$in": ids } })
        .await?
        .try_collect()
        .await?;
    let names: HashMap<&str, &Workspace> =
        workspaces.iter().map(|w| (w.id.as_str(), w)).collect();

    let mut teams: Vec<TopTeam> = tokens
        .into_iter()
        .map(|(workspace_id, (tokens_used, job_count))| {
            let found = names.get(workspace_id.as_str());
            TopTeam {
                name: found.map_or_else(
                    || crate::services::analytics::UNKNOWN_KEY.to_string(),
                    |w| w.name.clone(),
                ),
                plan: found.map_or_else(String::new, |w| w.plan.clone()),
                workspace_id,
                tokens_used,
                job_count,
            }
        })
        .collect();

    teams.sort_by(|a, b| b.tokens_used.cmp(&a.tokens_used));
    teams.truncate(limit.max(1));
    Ok(TopTeamsReport { teams, query_plan })
}

/// Response of `GET /api/admin/teams/recent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTeamsReport {
    pub teams: Vec<WorkspaceSummary>,
    pub query_plan: QueryPlan,
}

/// Most recently created workspaces, newest first.
pub async fn recent(store: &Store, limit: usize) -> Result<RecentTeamsReport, AppError> {
    let (workspaces, query_plan) = store::find_indexed_or_scan(
        &store.workspaces(),
        Document::new(),
        doc! { "createdAt": -1 },
        |_| true,
        |a, b| b.created_at.cmp(&a.created_at),
    )
    .await?;

    let mut teams: Vec<WorkspaceSummary> =
        workspaces.into_iter().map(WorkspaceSummary::from).collect();
    teams.truncate(limit.max(1));
    Ok(RecentTeamsReport { teams, query_plan })
}

/// Body of `POST /api/teams/{id}/audit-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub action: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

/// Response of `POST /api/teams/{id}/audit-logs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogPage {
    #[serde(flatten)]
    pub page: PagedResult<AuditLogResponse>,
    pub query_plan: QueryPlan,
}

/// Paged audit entries for a workspace, newest first, optionally filtered
/// by date range and action.
pub async fn audit_logs(
    store: &Store,
    workspace_id: &str,
    query: &AuditLogQuery,
) -> Result<AuditLogPage, AppError> {
    let range = match (&query.start, &query.end) {
        (Some(start), Some(end)) => Some(
            DateRange {
                start: start.clone(),
                end: end.clone(),
            }
            .parse()?,
        ),
        (None, None) => None,
        _ => {
            return Err(AppError::validation(
                "start and end must be provided together",
            ))
        }
    };

    let mut filter = doc! { "workspaceId": workspace_id };
    if let Some(range) = &range {
        let (from, to) = range.bson_bounds();
        filter.insert("createdAt", doc! { "$gte": from, "$lt": to });
    }
    if let Some(action) = &query.action {
        filter.insert("action", action.as_str());
    }

    let (logs, query_plan) = store::find_indexed_or_scan(
        &store.audit_logs(),
        filter,
        doc! { "createdAt": -1 },
        |log| audit_log_matches(log, workspace_id, range.as_ref(), query.action.as_deref()),
        |a, b| b.created_at.cmp(&a.created_at),
    )
    .await?;

    let responses: Vec<AuditLogResponse> =
        logs.into_iter().map(AuditLogResponse::from).collect();
    Ok(AuditLogPage {
        page: PagedResult::paginate(responses, &query.pagination),
        query_plan,
    })
}

/// Outcome of `POST /api/teams/{id}/api`, shaped per action.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TeamApiOutcome {
    #[serde(rename_all = "camelCase")]
    KeyCreated {
        /// Plaintext key material, returned exactly once.
        key: String,
        api_key: ApiKeyResponse,
    },
    #[serde(rename_all = "camelCase")]
    KeyRevoked { api_key: ApiKeyResponse },
    #[serde(rename_all = "camelCase")]
    WebhookAdded { webhook: WebhookEndpoint },
    #[serde(rename_all = "camelCase")]
    WebhookRemoved { removed_id: String },
}

/// Apply one API-surface management action to a workspace.
pub async fn api_action(
    store: &Store,
    workspace_id: &str,
    action: TeamApiAction,
    actor: &CurrentUser,
) -> Result<TeamApiOutcome, AppError> {
    // All actions address an existing workspace.
    store
        .workspaces()
        .find_one(doc! { "_id": workspace_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workspace {workspace_id} not found")))?;

    match action {
        TeamApiAction::CreateKey { label } => {
            if label.trim().is_empty() {
                return Err(AppError::validation("label must not be empty"));
            }
            let key = format!("cmk_{}", Uuid::new_v4().simple());
            let api_key = ApiKey {
                id: Uuid::new_v4().to_string(),
                workspace_id: workspace_id.to_string(),
                label,
                key_hash: hex::encode(Sha256::digest(key.as_bytes())),
                prefix: key[..12].to_string(),
                active: true,
                created_by: actor.uid.clone(),
                created_at: bson::DateTime::now(),
                revoked_at: None,
            };
            store.api_keys().insert_one(&api_key).await?;
            audit::record(
                store,
                Some(workspace_id),
                &actor.uid,
                "team.api_key.create",
                "apiKey",
                Some(&api_key.id),
                None,
            )
            .await?;
            Ok(TeamApiOutcome::KeyCreated {
                key,
                api_key: ApiKeyResponse::from(api_key),
            })
        }
        TeamApiAction::RevokeKey { key_id } => {
            let revoked = store
                .api_keys()
                .find_one_and_update(
                    doc! { "_id": key_id.as_str(), "workspaceId": workspace_id },
                    doc! { "$set": { "active": false, "revokedAt": bson::DateTime::now() } },
                )
                .return_document(ReturnDocument::After)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("API key {key_id} not found")))?;
            audit::record(
                store,
                Some(workspace_id),
                &actor.uid,
                "team.api_key.revoke",
                "apiKey",
                Some(&key_id),
                None,
            )
            .await?;
            Ok(TeamApiOutcome::KeyRevoked {
                api_key: ApiKeyResponse::from(revoked),
            })
        }
        TeamApiAction::AddWebhook { url, events } => {
            if !url.starts_with("https://") {
                return Err(AppError::validation("webhook url must use https"));
            }
            let webhook = WebhookEndpoint {
                id: Uuid::new_v4().to_string(),
                workspace_id: workspace_id.to_string(),
                url,
                events,
                active: true,
                created_at: bson::DateTime::now(),
            };
            store.webhook_endpoints().insert_one(&webhook).await?;
            audit::record(
                store,
                Some(workspace_id),
                &actor.uid,
                "team.webhook.add",
                "webhookEndpoint",
                Some(&webhook.id),
                None,
            )
            .await?;
            Ok(TeamApiOutcome::WebhookAdded { webhook })
        }
        TeamApiAction::RemoveWebhook { webhook_id } => {
            let deleted = store
                .webhook_endpoints()
                .delete_one(doc! { "_id": webhook_id.as_str(), "workspaceId": workspace_id })
                .await?;
            if deleted.deleted_count == 0 {
                return Err(AppError::NotFound(format!(
                    "Webhook {webhook_id} not found"
                )));
            }
            audit::record(
                store,
                Some(workspace_id),
                &actor.uid,
                "team.webhook.remove",
                "webhookEndpoint",
                Some(&webhook_id),
                None,
            )
            .await?;
            Ok(TeamApiOutcome::WebhookRemoved {
                removed_id: webhook_id,
            })
        }
    }
}

/// Pull a member out of a workspace's embedded membership list.
pub async fn remove_member(
    store: &Store,
    workspace_id: &str,
    request: &RemoveMemberRequest,
    actor: &CurrentUser,
) -> Result<(), AppError> {
    request.validate().map_err(AppError::validation_details)?;

    let result = store
        .workspaces()
        .update_one(
            doc! { "_id": workspace_id },
            doc! { "$pull": { "members": { "uid": request.user_id.as_str() } } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!(
            "Workspace {workspace_id} not found"
        )));
    }
    if result.modified_count == 0 {
        return Err(AppError::NotFound(format!(
            "User {} is not a member of workspace {workspace_id}",
            request.user_id
        )));
    }

    audit::record(
        store,
        Some(workspace_id),
        &actor.uid,
        "team.member.remove",
        "workspaceMember",
        Some(&request.user_id),
        None,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: &str) -> bson::DateTime {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        bson::DateTime::from_chrono(day.and_hms_opt(12, 0, 0).unwrap().and_utc())
    }

    fn range(start: &str, end: &str) -> ResolvedRange {
        DateRange {
            start: start.to_string(),
            end: end.to_string(),
        }
        .parse()
        .unwrap()
    }

    fn log(workspace: Option<&str>, action: &str, date: &str) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace.map(str::to_string),
            actor_uid: "uid-1".to_string(),
            action: action.to_string(),
            entity_type: "apiKey".to_string(),
            entity_id: None,
            details: None,
            ip_address: None,
            created_at: at(date),
        }
    }

    fn job(date: &str) -> ProcessingJob {
        ProcessingJob {
            id: Uuid::new_v4().to_string(),
            session_id: "s1".to_string(),
            user_id: "uid-1".to_string(),
            workspace_id: Some("ws-1".to_string()),
            tokens_used: 10,
            cost_usd: 0.0,
            status: "completed".to_string(),
            created_at: at(date),
        }
    }

    #[test]
    fn job_scan_predicate_keeps_only_jobs_inside_the_range() {
        let range = range("2024-01-01", "2024-01-31");
        assert!(job_in_range(&job("2024-01-01"), &range));
        assert!(job_in_range(&job("2024-01-31"), &range));
        assert!(!job_in_range(&job("2023-12-31"), &range));
        assert!(!job_in_range(&job("2024-02-01"), &range));
    }

    #[test]
    fn audit_scan_predicate_applies_workspace_range_and_action() {
        let range = range("2024-01-01", "2024-01-31");
        let entry = log(Some("ws-1"), "team.api_key.create", "2024-01-15");

        assert!(audit_log_matches(&entry, "ws-1", Some(&range), None));
        assert!(audit_log_matches(
            &entry,
            "ws-1",
            Some(&range),
            Some("team.api_key.create"),
        ));

        // Any one mismatched filter excludes the entry.
        assert!(!audit_log_matches(&entry, "ws-2", Some(&range), None));
        assert!(!audit_log_matches(
            &entry,
            "ws-1",
            Some(&range),
            Some("team.webhook.add"),
        ));
        let outside = log(Some("ws-1"), "team.api_key.create", "2024-02-02");
        assert!(!audit_log_matches(&outside, "ws-1", Some(&range), None));
        let unscoped = log(None, "team.api_key.create", "2024-01-15");
        assert!(!audit_log_matches(&unscoped, "ws-1", None, None));
    }

    #[test]
    fn audit_scan_predicate_without_filters_keeps_the_workspace() {
        let entry = log(Some("ws-1"), "team.member.remove", "2020-06-01");
        assert!(audit_log_matches(&entry, "ws-1", None, None));
    }

    #[test]
    fn audit_query_requires_both_range_ends() {
        let query = AuditLogQuery {
            start: Some("2024-01-01".to_string()),
            end: None,
            ..Default::default()
        };
        // The range check happens before any store access.
        let parsed = match (&query.start, &query.end) {
            (Some(_), None) | (None, Some(_)) => Err(()),
            _ => Ok(()),
        };
        assert!(parsed.is_err());
    }

    #[test]
    fn key_created_outcome_serializes_plaintext_once() {
        let now = bson::DateTime::now();
        let outcome = TeamApiOutcome::KeyCreated {
            key: "cmk_abc123".to_string(),
            api_key: ApiKeyResponse {
                id: "key-1".to_string(),
                workspace_id: "ws-1".to_string(),
                label: "ci".to_string(),
                prefix: "cmk_abc123"[..10].to_string(),
                active: true,
                created_by: "uid-1".to_string(),
                created_at: now.to_chrono(),
                revoked_at: None,
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["key"], "cmk_abc123");
        assert!(json["apiKey"].get("keyHash").is_none());
    }
}
