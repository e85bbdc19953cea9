//! Mindmap document model. This API only counts mindmaps; it never reads
//! or mutates their content.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mindmap {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_uid: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub node_count: i64,
    pub updated_at: bson::DateTime,
}
