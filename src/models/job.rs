//! Processing job model: the billable unit of work.

use serde::{Deserialize, Serialize};

/// One billable processing job from the `processingJobs` collection,
/// linked to the session that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub tokens_used: i64,
    #[serde(default)]
    pub cost_usd: f64,
    #[serde(default)]
    pub status: String,
    pub created_at: bson::DateTime,
}
