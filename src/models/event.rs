//! Analytics event model.
//!
//! Events are append-only: the product writes them, this API only reads
//! them back through filtered range queries. `event_type` refines `kind`
//! (e.g. kind `export`, event_type `pdf_export`), and `metadata` is a
//! free-form document whose fields vary per kind.

use bson::Document;
use serde::{Deserialize, Serialize};

/// One append-only analytics log record from the `analyticsEvents`
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: bson::DateTime,
    #[serde(default)]
    pub metadata: Document,
}

impl AnalyticsEvent {
    /// Read a string metadata field, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get_str(key).ok()
    }

    /// Read a boolean metadata field, if present.
    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get_bool(key).ok()
    }

    /// Read a numeric metadata field as f64, accepting int32/int64/double.
    pub fn meta_number(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(bson::Bson::Double(v)) => Some(*v),
            Some(bson::Bson::Int32(v)) => Some(*v as f64),
            Some(bson::Bson::Int64(v)) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Event kinds this API aggregates over. Stored as plain strings; the
/// constants keep route and seed code in agreement.
pub mod kinds {
    pub const CALL_LOG: &str = "call_log";
    pub const CONTACT: &str = "contact";
    pub const EXPORT: &str = "export";
    pub const FILE_CONVERSION: &str = "file_conversion";
    pub const MINDMAP_EDIT: &str = "mindmap_edit";
    pub const SECURITY: &str = "security";
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn event(metadata: Document) -> AnalyticsEvent {
        AnalyticsEvent {
            id: "evt-1".to_string(),
            kind: kinds::EXPORT.to_string(),
            event_type: None,
            user_id: None,
            workspace_id: None,
            session_id: None,
            timestamp: bson::DateTime::now(),
            metadata,
        }
    }

    #[test]
    fn metadata_accessors_read_typed_fields() {
        let e = event(doc! {
            "format": "pdf",
            "success": true,
            "durationSeconds": 42_i32,
        });
        assert_eq!(e.meta_str("format"), Some("pdf"));
        assert_eq!(e.meta_bool("success"), Some(true));
        assert_eq!(e.meta_number("durationSeconds"), Some(42.0));
    }

    #[test]
    fn metadata_accessors_tolerate_missing_and_mistyped_fields() {
        let e = event(doc! { "format": 7_i32 });
        assert_eq!(e.meta_str("format"), None);
        assert_eq!(e.meta_bool("success"), None);
        assert_eq!(e.meta_number("missing"), None);
    }

    #[test]
    fn deserializes_with_type_field_renamed() {
        let doc = doc! {
            "_id": "evt-9",
            "type": "file_conversion",
            "timestamp": bson::DateTime::now(),
        };
        let e: AnalyticsEvent = bson::from_document(doc).unwrap();
        assert_eq!(e.kind, kinds::FILE_CONVERSION);
        assert!(e.event_type.is_none());
        assert!(e.metadata.is_empty());
    }
}
