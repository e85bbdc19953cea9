//! Audit trail writer used by every mutating admin route.

use mongodb::bson::Document;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::AuditLog;
use crate::store::Store;

/// Append one audit entry.
pub async fn record(
    store: &Store,
    workspace_id: Option<&str>,
    actor_uid: &str,
    action: &str,
    entity_type: &str,
    entity_id: Option<&str>,
    details: Option<Document>,
) -> Result<(), AppError> {
    let entry = AuditLog {
        id: Uuid::new_v4().to_string(),
        workspace_id: workspace_id.map(str::to_string),
        actor_uid: actor_uid.to_string(),
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.map(str::to_string),
        details,
        ip_address: None,
        created_at: bson::DateTime::now(),
    };
    store.audit_logs().insert_one(&entry).await?;
    Ok(())
}
