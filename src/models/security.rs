//! Security posture records: incidents and account deletion requests.

use serde::{Deserialize, Serialize};

/// One record from the `incidents` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    #[serde(rename = "_id")]
    pub id: String,
    pub severity: String,
    pub status: IncidentStatus,
    pub summary: String,
    pub opened_at: bson::DateTime,
    #[serde(default)]
    pub resolved_at: Option<bson::DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncidentStatus {
    Open,
    Resolved,
}

/// One record from the `deletionRequests` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub status: DeletionStatus,
    pub requested_at: bson::DateTime,
    #[serde(default)]
    pub processed_at: Option<bson::DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletionStatus {
    Pending,
    Completed,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_as_stored_strings() {
        assert_eq!(
            serde_json::to_string(&IncidentStatus::Resolved).unwrap(),
            "\"resolved\""
        );
        assert_eq!(
            serde_json::to_string(&DeletionStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
