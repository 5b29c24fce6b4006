//! Wire types of the backend contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single object detection as published by a camera device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Bounding box, usually `{x, y, width, height}`.
    pub bbox: Value,
    pub confidence: f64,
    pub utc: String,
}

/// One message on the detection stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFrame {
    #[serde(default)]
    pub frame: Option<Value>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A stored detection as listed by `GET /collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: String,
    pub bbox: Option<Value>,
    pub confidence: Option<Value>,
    pub utc: Option<Value>,
    #[serde(default)]
    pub did: Option<Value>,
}

/// Detections grouped by label.
pub type CollectionView = BTreeMap<String, Vec<DetectionRecord>>;

/// Collection name → item count.
pub type CollectionSummary = BTreeMap<String, usize>;

/// A stored item with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub document: String,
    pub metadata: serde_json::Map<String, Value>,
}

/// Body of `POST /collections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCollection {
    pub name: String,
}

/// A collection and all of its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDetail {
    pub name: String,
    pub items: Vec<Item>,
}

/// Per-label statistics over the default collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub total: usize,
    #[serde(rename = "lastData")]
    pub last_data: Option<String>,
    #[serde(rename = "additionalInfo")]
    pub additional_info: LabelStatsInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStatsInfo {
    pub first_detection: Option<String>,
    pub last_detection: Option<String>,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Response of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub context: String,
    pub answer: String,
}

/// Body of `POST /query-collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    pub collection: String,
    #[serde(default)]
    pub filter: serde_json::Map<String, Value>,
}

/// Response of `POST /query-collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub results: Vec<Item>,
}

/// Outcome of a start or stop call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    #[serde(rename = "started")]
    Started,
    #[serde(rename = "already running")]
    AlreadyRunning,
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "not running")]
    NotRunning,
}

impl Transition {
    /// Whether the call changed the session state.
    pub fn changed(&self) -> bool {
        matches!(self, Transition::Started | Transition::Stopped)
    }
}

/// Body of the start and stop responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTransition {
    pub status: Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Stopped,
    Error,
}

/// Response of `GET /mqtt/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub running: bool,
    pub state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error body returned with every non-2xx application response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_wire_names() {
        let started: SessionTransition = serde_json::from_value(json!({"status": "started"})).unwrap();
        assert_eq!(started.status, Transition::Started);

        let again: SessionTransition =
            serde_json::from_value(json!({"status": "already running"})).unwrap();
        assert_eq!(again.status, Transition::AlreadyRunning);
        assert!(!again.status.changed());
    }

    #[test]
    fn status_accepts_missing_detail() {
        let status: SessionStatus =
            serde_json::from_value(json!({"running": false, "state": "stopped"})).unwrap();
        assert_eq!(status.state, SessionState::Stopped);
        assert!(status.detail.is_none());
    }

    #[test]
    fn label_stats_uses_camel_case_keys() {
        let stats = LabelStats {
            total: 1,
            last_data: Some("{}".into()),
            additional_info: LabelStatsInfo {
                first_detection: Some("{}".into()),
                last_detection: Some("{}".into()),
            },
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("lastData").is_some());
        assert!(value.get("additionalInfo").is_some());
    }

    #[test]
    fn collection_query_filter_defaults_empty() {
        let query: CollectionQuery = serde_json::from_value(json!({"collection": "pi5"})).unwrap();
        assert!(query.filter.is_empty());
    }
}
