//! Workspace (team) model plus the API keys and webhook endpoints that
//! hang off a workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tenant grouping of users sharing billing and plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plan: String,
    pub owner_uid: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub members: Vec<WorkspaceMember>,
    pub created_at: bson::DateTime,
}

fn default_active() -> bool {
    true
}

/// Membership entry embedded in the workspace document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    pub joined_at: bson::DateTime,
}

/// Workspace summary DTO for admin listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
    pub plan: String,
    pub owner_uid: String,
    pub active: bool,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Workspace> for WorkspaceSummary {
    fn from(w: Workspace) -> Self {
        Self {
            id: w.id,
            name: w.name,
            plan: w.plan,
            owner_uid: w.owner_uid,
            active: w.active,
            member_count: w.members.len(),
            created_at: w.created_at.to_chrono(),
        }
    }
}

/// API key issued for a workspace. Only the SHA-256 hash of the key
/// material is stored; the plaintext is returned once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(rename = "_id")]
    pub id: String,
    pub workspace_id: String,
    pub label: String,
    pub key_hash: String,
    pub prefix: String,
    pub active: bool,
    pub created_by: String,
    pub created_at: bson::DateTime,
    #[serde(default)]
    pub revoked_at: Option<bson::DateTime>,
}

/// API key DTO: everything except the hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub id: String,
    pub workspace_id: String,
    pub label: String,
    pub prefix: String,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(k: ApiKey) -> Self {
        Self {
            id: k.id,
            workspace_id: k.workspace_id,
            label: k.label,
            prefix: k.prefix,
            active: k.active,
            created_by: k.created_by,
            created_at: k.created_at.to_chrono(),
            revoked_at: k.revoked_at.map(|t| t.to_chrono()),
        }
    }
}

/// Webhook endpoint registered for a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpoint {
    #[serde(rename = "_id")]
    pub id: String,
    pub workspace_id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: bson::DateTime,
}

/// Tagged action body for `POST /api/teams/{id}/api`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TeamApiAction {
    #[serde(rename_all = "camelCase")]
    CreateKey { label: String },
    #[serde(rename_all = "camelCase")]
    RevokeKey { key_id: String },
    #[serde(rename_all = "camelCase")]
    AddWebhook { url: String, events: Vec<String> },
    #[serde(rename_all = "camelCase")]
    RemoveWebhook { webhook_id: String },
}

/// Body of `POST /api/teams/{id}/users/remove`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn team_api_action_parses_tagged_bodies() {
        let action: TeamApiAction =
            serde_json::from_value(json!({"action": "createKey", "label": "ci"})).unwrap();
        assert!(matches!(action, TeamApiAction::CreateKey { ref label } if label == "ci"));

        let action: TeamApiAction = serde_json::from_value(
            json!({"action": "addWebhook", "url": "https://example.com/hook", "events": ["export"]}),
        )
        .unwrap();
        assert!(matches!(action, TeamApiAction::AddWebhook { ref events, .. } if events.len() == 1));
    }

    #[test]
    fn team_api_action_rejects_unknown_action() {
        let parsed: Result<TeamApiAction, _> =
            serde_json::from_value(json!({"action": "rotateKey"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn workspace_summary_counts_members() {
        let now = bson::DateTime::now();
        let workspace = Workspace {
            id: "ws-1".to_string(),
            name: "Acme".to_string(),
            plan: "pro".to_string(),
            owner_uid: "uid-1".to_string(),
            active: true,
            members: vec![
                WorkspaceMember {
                    uid: "uid-1".to_string(),
                    email: "owner@acme.test".to_string(),
                    role: "owner".to_string(),
                    joined_at: now,
                },
                WorkspaceMember {
                    uid: "uid-2".to_string(),
                    email: "dev@acme.test".to_string(),
                    role: "member".to_string(),
                    joined_at: now,
                },
            ],
            created_at: now,
        };
        let summary = WorkspaceSummary::from(workspace);
        assert_eq!(summary.member_count, 2);
        assert!(summary.active);
    }

    #[test]
    fn api_key_response_never_carries_the_hash() {
        let key = ApiKey {
            id: "key-1".to_string(),
            workspace_id: "ws-1".to_string(),
            label: "ci".to_string(),
            key_hash: "deadbeef".to_string(),
            prefix: "cmk_ab12".to_string(),
            active: true,
            created_by: "uid-1".to_string(),
            created_at: bson::DateTime::now(),
            revoked_at: None,
        };
        let json = serde_json::to_value(ApiKeyResponse::from(key)).unwrap();
        assert!(json.get("keyHash").is_none());
        assert_eq!(json["prefix"], "cmk_ab12");
    }
}
