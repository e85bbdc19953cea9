//! Audit log entries written by mutating admin routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the `auditLogs` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub actor_uid: String,
    pub action: String,
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub details: Option<bson::Document>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub created_at: bson::DateTime,
}

/// Audit entry DTO returned by `POST /api/teams/{id}/audit-logs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: String,
    pub workspace_id: Option<String>,
    pub actor_uid: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(a: AuditLog) -> Self {
        Self {
            id: a.id,
            workspace_id: a.workspace_id,
            actor_uid: a.actor_uid,
            action: a.action,
            entity_type: a.entity_type,
            entity_id: a.entity_id,
            details: a.details.and_then(|d| serde_json::to_value(d).ok()),
            ip_address: a.ip_address,
            created_at: a.created_at.to_chrono(),
        }
    }
}
