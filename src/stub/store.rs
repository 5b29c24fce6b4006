//! In-memory collection store.
//!
//! # Responsibilities
//! - Hold named collections of items
//! - Ingest detection frames into the default collection
//! - Answer label, metadata and free-text lookups
//!
//! # Design Decisions
//! - One `DashMap` shard lock per collection; no lock is held across `.await`
//! - Items keep insertion order so first/last detection are well defined

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::gateway::types::{
    CollectionDetail, CollectionSummary, CollectionView, DetectionRecord, IngestFrame, Item,
    LabelStats, LabelStatsInfo,
};

/// Name of the collection detections are ingested into.
pub const DEFAULT_COLLECTION: &str = "bifrost_data";

/// Upper bound on detections returned as query context.
pub const MAX_CONTEXT_RESULTS: usize = 100;

const MAX_NAME_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("collection `{0}` already exists")]
    Conflict(String),

    #[error("collection `{0}` not found")]
    NotFound(String),

    #[error("invalid collection name `{0}`")]
    InvalidName(String),

    #[error("No documents found")]
    Empty,
}

#[derive(Debug)]
pub struct CollectionStore {
    collections: DashMap<String, Vec<Item>>,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    /// A store holding only the empty default collection.
    pub fn new() -> Self {
        let collections = DashMap::new();
        collections.insert(DEFAULT_COLLECTION.to_string(), Vec::new());
        Self { collections }
    }

    pub fn summary(&self) -> CollectionSummary {
        self.collections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    pub fn create(&self, name: &str) -> Result<CollectionDetail, StoreError> {
        let name = name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains('/') {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Vec::new());
                Ok(CollectionDetail {
                    name: name.to_string(),
                    items: Vec::new(),
                })
            }
        }
    }

    pub fn fetch(&self, name: &str) -> Result<CollectionDetail, StoreError> {
        self.collections
            .get(name)
            .map(|items| CollectionDetail {
                name: name.to_string(),
                items: items.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Append one item to a collection.
    pub fn insert(&self, collection: &str, item: Item) -> Result<(), StoreError> {
        let mut items = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        items.push(item);
        Ok(())
    }

    /// Store every detection of a frame in the default collection.
    ///
    /// Returns the number of items added.
    pub fn ingest(&self, frame: &IngestFrame) -> usize {
        let mut items = self
            .collections
            .entry(DEFAULT_COLLECTION.to_string())
            .or_default();

        for detection in &frame.detections {
            let mut metadata = Map::new();
            metadata.insert("label".into(), Value::String(detection.label.clone()));
            metadata.insert("bbox".into(), Value::String(detection.bbox.to_string()));
            metadata.insert("confidence".into(), Value::from(detection.confidence));
            metadata.insert("utc".into(), Value::String(detection.utc.clone()));

            items.push(Item {
                id: Uuid::new_v4().to_string(),
                document: serde_json::to_string(detection).unwrap_or_default(),
                metadata,
            });
        }

        tracing::debug!(
            frame = ?frame.frame,
            detections = frame.detections.len(),
            "Frame ingested"
        );
        frame.detections.len()
    }

    /// Default collection grouped by label.
    pub fn detections_by_label(&self) -> CollectionView {
        let mut view = CollectionView::new();
        if let Some(items) = self.collections.get(DEFAULT_COLLECTION) {
            for item in items.iter() {
                let label = item
                    .metadata
                    .get("label")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                view.entry(label).or_default().push(DetectionRecord {
                    id: item.id.clone(),
                    bbox: item.metadata.get("bbox").cloned(),
                    confidence: item.metadata.get("confidence").cloned(),
                    utc: item.metadata.get("utc").cloned(),
                    did: item.metadata.get("Detection").cloned(),
                });
            }
        }
        view
    }

    /// Statistics for one label of the default collection.
    pub fn label_stats(&self, label: &str) -> Result<LabelStats, StoreError> {
        let items = self
            .collections
            .get(DEFAULT_COLLECTION)
            .ok_or(StoreError::Empty)?;
        if items.is_empty() {
            return Err(StoreError::Empty);
        }

        let documents: Vec<&str> = items
            .iter()
            .filter(|item| item.metadata.get("label").and_then(Value::as_str) == Some(label))
            .map(|item| item.document.as_str())
            .collect();

        let first = documents.first().map(|d| d.to_string());
        let last = documents.last().map(|d| d.to_string());
        Ok(LabelStats {
            total: documents.len(),
            last_data: last.clone(),
            additional_info: LabelStatsInfo {
                first_detection: first,
                last_detection: last,
            },
        })
    }

    /// Items of `collection` whose metadata matches every filter entry.
    ///
    /// Values compare by their string form, so `0.9` matches `"0.9"`.
    pub fn filter(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Vec<Item>, StoreError> {
        let items = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;

        Ok(items
            .iter()
            .filter(|item| {
                filter.iter().all(|(key, expected)| {
                    item.metadata
                        .get(key)
                        .map(|actual| value_text(actual) == value_text(expected))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect())
    }

    /// Default-collection items whose label occurs in the question.
    pub fn search(&self, question: &str) -> Vec<Item> {
        let question = question.to_lowercase();
        self.collections
            .get(DEFAULT_COLLECTION)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| {
                        item.metadata
                            .get("label")
                            .and_then(Value::as_str)
                            .map(str::trim)
                            .filter(|label| !label.is_empty())
                            .map(|label| question.contains(&label.to_lowercase()))
                            .unwrap_or(false)
                    })
                    .take(MAX_CONTEXT_RESULTS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::Detection;
    use serde_json::json;

    fn frame(labels: &[&str]) -> IngestFrame {
        IngestFrame {
            frame: Some(json!(1)),
            detections: labels
                .iter()
                .enumerate()
                .map(|(i, label)| Detection {
                    label: label.to_string(),
                    bbox: json!({"x": i, "y": 0, "width": 10, "height": 10}),
                    confidence: 0.5 + i as f64 / 10.0,
                    utc: format!("2024-01-01T00:00:0{i}Z"),
                })
                .collect(),
        }
    }

    #[test]
    fn blank_labels_never_match_a_question() {
        let store = CollectionStore::new();
        store.ingest(&frame(&["", "  ", "car"]));

        let hits = store.search("any cars today?");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["label"], "car");
        assert!(store.search("anything at all").is_empty());
    }

    #[test]
    fn default_collection_exists() {
        let store = CollectionStore::new();
        assert_eq!(store.summary().get(DEFAULT_COLLECTION), Some(&0));
    }

    #[test]
    fn create_rejects_duplicates() {
        let store = CollectionStore::new();
        store.create("pi5").unwrap();
        assert_eq!(store.create("pi5"), Err(StoreError::Conflict("pi5".into())));
        assert_eq!(
            store.create(DEFAULT_COLLECTION),
            Err(StoreError::Conflict(DEFAULT_COLLECTION.into()))
        );
    }

    #[test]
    fn create_rejects_bad_names() {
        let store = CollectionStore::new();
        assert!(matches!(store.create("  "), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.create("a/b"), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.create(&"x".repeat(64)), Err(StoreError::InvalidName(_))));
    }

    #[test]
    fn delete_then_fetch_is_not_found() {
        let store = CollectionStore::new();
        store.create("pi5_camera_1").unwrap();
        store.delete("pi5_camera_1").unwrap();
        assert!(matches!(store.fetch("pi5_camera_1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("pi5_camera_1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn ingest_groups_by_label() {
        let store = CollectionStore::new();
        assert_eq!(store.ingest(&frame(&["person", "car", "person"])), 3);

        let view = store.detections_by_label();
        assert_eq!(view["person"].len(), 2);
        assert_eq!(view["car"].len(), 1);
        assert_eq!(store.summary()[DEFAULT_COLLECTION], 3);
    }

    #[test]
    fn label_stats_first_and_last() {
        let store = CollectionStore::new();
        assert_eq!(store.label_stats("person"), Err(StoreError::Empty));

        store.ingest(&frame(&["person", "car", "person"]));
        let stats = store.label_stats("person").unwrap();
        assert_eq!(stats.total, 2);
        assert!(stats.additional_info.first_detection.unwrap().contains("00:00:00"));
        assert!(stats.last_data.unwrap().contains("00:00:02"));

        let none = store.label_stats("dog").unwrap();
        assert_eq!(none.total, 0);
        assert!(none.last_data.is_none());
    }

    #[test]
    fn filter_compares_string_forms() {
        let store = CollectionStore::new();
        store.ingest(&frame(&["person", "car"]));

        let mut filter = Map::new();
        filter.insert("label".into(), json!("car"));
        let hits = store.filter(DEFAULT_COLLECTION, &filter).unwrap();
        assert_eq!(hits.len(), 1);

        filter.insert("confidence".into(), json!("0.6"));
        assert_eq!(store.filter(DEFAULT_COLLECTION, &filter).unwrap().len(), 1);

        filter.insert("confidence".into(), json!(0.9));
        assert!(store.filter(DEFAULT_COLLECTION, &filter).unwrap().is_empty());

        assert_eq!(store.filter(DEFAULT_COLLECTION, &Map::new()).unwrap().len(), 2);
        assert!(matches!(store.filter("missing", &filter), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn search_matches_labels_case_insensitively() {
        let store = CollectionStore::new();
        store.ingest(&frame(&["Person", "car"]));
        assert_eq!(store.search("how many PERSON sightings?").len(), 1);
        assert!(store.search("any bicycles?").is_empty());
    }
}
