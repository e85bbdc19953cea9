//! Saved dashboard definitions, one document per dashboard keyed by the
//! owning user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One saved dashboard from the `dashboards` collection. Widgets are a
/// free-form array owned by the frontend; this API stores them opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_uid: String,
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<bson::Document>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

/// Dashboard DTO with RFC 3339 timestamps and JSON widgets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub id: String,
    pub owner_uid: String,
    pub name: String,
    pub widgets: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            id: d.id,
            owner_uid: d.owner_uid,
            name: d.name,
            widgets: d
                .widgets
                .into_iter()
                .filter_map(|w| serde_json::to_value(w).ok())
                .collect(),
            created_at: d.created_at.to_chrono(),
            updated_at: d.updated_at.to_chrono(),
        }
    }
}

/// Body of `POST /api/dashboards`: create when `id` is absent, update the
/// caller's dashboard when present.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveDashboardRequest {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_request_validates_name_length() {
        let req = SaveDashboardRequest {
            id: None,
            name: String::new(),
            widgets: vec![],
        };
        assert!(req.validate().is_err());

        let req = SaveDashboardRequest {
            id: None,
            name: "Usage overview".to_string(),
            widgets: vec![],
        };
        assert!(req.validate().is_ok());
    }
}
