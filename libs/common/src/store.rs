//! In-memory document store
//!
//! Collections hold schemaless JSON documents addressed by a string `id`.
//! The store exposes the narrow surface the API layer is written against:
//! filtered find with sort, skip/limit and projection, match counting, and
//! id-addressed read, update and delete. Unique indexes are enforced on
//! insert and update. Single-document operations are atomic; there are no
//! multi-document transactions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::filter::{SortKey, matches, order_documents};

/// Options for a find operation
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Fields to return per document; empty means all. `id` is always kept.
    pub projection: Vec<String>,
    /// Ordered sort keys applied before skip/limit
    pub sort: Vec<SortKey>,
    /// Number of matching documents to skip
    pub skip: usize,
    /// Maximum number of documents to return
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Value>,
    unique_indexes: Vec<Vec<String>>,
}

/// In-memory document store with named collections
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, CollectionData>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection so reads and writes against it succeed
    pub async fn register_collection(&self, name: &str) {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        debug!("Registered collection '{}'", name);
    }

    /// Declare a unique index over one or more fields of a collection
    ///
    /// Documents missing any indexed field are exempt from the index.
    pub async fn add_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        data.unique_indexes
            .push(fields.iter().map(|f| f.to_string()).collect());
        Ok(())
    }

    /// Insert a document, assigning `id` and `created_at` when absent
    pub async fn insert(&self, collection: &str, mut document: Value) -> StoreResult<Value> {
        let Some(fields) = document.as_object_mut() else {
            return Err(StoreError::InvalidDocument(
                "document must be a JSON object".to_string(),
            ));
        };

        if !fields.contains_key("id") {
            fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !fields.contains_key("created_at") {
            fields.insert(
                "created_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        check_unique_indexes(collection, data, &document, None)?;
        data.documents.push(document.clone());
        Ok(document)
    }

    /// Find documents matching a filter, ordered, windowed and projected
    pub async fn find(
        &self,
        collection: &str,
        filter: &Value,
        options: &FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let data = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let mut results: Vec<Value> = data
            .documents
            .iter()
            .filter(|doc| matches(doc, filter))
            .cloned()
            .collect();

        order_documents(&mut results, &options.sort);

        let windowed: Vec<Value> = results
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|doc| project(doc, &options.projection))
            .collect();

        Ok(windowed)
    }

    /// Count documents matching a filter, ignoring any pagination window
    pub async fn count(&self, collection: &str, filter: &Value) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let data = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(data.documents.iter().filter(|doc| matches(doc, filter)).count() as u64)
    }

    /// Look up a single document by id
    pub async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        let data = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        Ok(data
            .documents
            .iter()
            .find(|doc| document_id(doc) == Some(id))
            .cloned())
    }

    /// Shallow-merge a patch into the document with the given id
    ///
    /// Patch fields replace existing fields wholesale; a null patch value
    /// clears the field. Unique indexes are re-checked against the merged
    /// document. Returns the updated document, or `None` for an unknown id.
    pub async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: &Value,
    ) -> StoreResult<Option<Value>> {
        let Some(patch_fields) = patch.as_object() else {
            return Err(StoreError::InvalidDocument(
                "patch must be a JSON object".to_string(),
            ));
        };

        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let Some(position) = data
            .documents
            .iter()
            .position(|doc| document_id(doc) == Some(id))
        else {
            return Ok(None);
        };

        let mut updated = data.documents[position].clone();
        if let Some(fields) = updated.as_object_mut() {
            for (key, value) in patch_fields {
                if key == "id" {
                    continue;
                }
                fields.insert(key.clone(), value.clone());
            }
        }

        check_unique_indexes(collection, data, &updated, Some(position))?;
        data.documents[position] = updated.clone();
        Ok(Some(updated))
    }

    /// Remove the document with the given id, returning it
    pub async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let Some(position) = data
            .documents
            .iter()
            .position(|doc| document_id(doc) == Some(id))
        else {
            return Ok(None);
        };

        Ok(Some(data.documents.remove(position)))
    }
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

/// Reduce a document to the projected fields, always keeping `id`
pub fn project(document: Value, projection: &[String]) -> Value {
    if projection.is_empty() {
        return document;
    }

    let Value::Object(fields) = document else {
        return document;
    };

    let mut projected = Map::new();
    if let Some(id) = fields.get("id") {
        projected.insert("id".to_string(), id.clone());
    }
    for field in projection {
        if let Some(value) = fields.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    Value::Object(projected)
}

fn check_unique_indexes(
    collection: &str,
    data: &CollectionData,
    candidate: &Value,
    skip_position: Option<usize>,
) -> StoreResult<()> {
    for index_fields in &data.unique_indexes {
        // Documents missing an indexed field are exempt.
        let Some(candidate_values) = index_fields
            .iter()
            .map(|field| candidate.get(field).filter(|v| !v.is_null()))
            .collect::<Option<Vec<&Value>>>()
        else {
            continue;
        };

        let conflict = data.documents.iter().enumerate().any(|(position, doc)| {
            if Some(position) == skip_position {
                return false;
            }
            index_fields
                .iter()
                .zip(&candidate_values)
                .all(|(field, value)| doc.get(field) == Some(*value))
        });

        if conflict {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                fields: index_fields.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortKey;
    use serde_json::json;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.register_collection("bootcamps").await;
        store
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at_when_absent() {
        let store = seeded_store().await;
        let inserted = store
            .insert("bootcamps", json!({"name": "Devworks"}))
            .await
            .unwrap();

        assert!(inserted.get("id").and_then(Value::as_str).is_some());
        assert!(inserted.get("created_at").and_then(Value::as_str).is_some());
    }

    #[tokio::test]
    async fn insert_keeps_caller_supplied_id() {
        let store = seeded_store().await;
        let inserted = store
            .insert("bootcamps", json!({"id": "fixed", "name": "Devworks"}))
            .await
            .unwrap();
        assert_eq!(inserted["id"], "fixed");

        let found = store.find_by_id("bootcamps", "fixed").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn insert_rejects_non_object_documents() {
        let store = seeded_store().await;
        let result = store.insert("bootcamps", json!("not-an-object")).await;
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn unknown_collection_is_an_error() {
        let store = MemoryStore::new();
        let result = store.count("missing", &json!({})).await;
        assert!(matches!(result, Err(StoreError::UnknownCollection(_))));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_insert() {
        let store = seeded_store().await;
        store
            .add_unique_index("bootcamps", &["name"])
            .await
            .unwrap();

        store
            .insert("bootcamps", json!({"name": "Devworks"}))
            .await
            .unwrap();
        let duplicate = store.insert("bootcamps", json!({"name": "Devworks"})).await;

        assert!(matches!(
            duplicate,
            Err(StoreError::Duplicate { fields, .. }) if fields == vec!["name".to_string()]
        ));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_on_update_but_allows_self() {
        let store = seeded_store().await;
        store
            .add_unique_index("bootcamps", &["name"])
            .await
            .unwrap();

        let first = store
            .insert("bootcamps", json!({"name": "Devworks"}))
            .await
            .unwrap();
        store
            .insert("bootcamps", json!({"name": "Codemasters"}))
            .await
            .unwrap();

        let id = first["id"].as_str().unwrap();

        // Renaming over another document's name is rejected.
        let clash = store
            .update_by_id("bootcamps", id, &json!({"name": "Codemasters"}))
            .await;
        assert!(matches!(clash, Err(StoreError::Duplicate { .. })));

        // Re-writing its own name is fine.
        let same = store
            .update_by_id("bootcamps", id, &json!({"name": "Devworks"}))
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn compound_unique_index_covers_field_combinations() {
        let store = MemoryStore::new();
        store.register_collection("reviews").await;
        store
            .add_unique_index("reviews", &["bootcamp_id", "user_id"])
            .await
            .unwrap();

        store
            .insert("reviews", json!({"bootcamp_id": "b1", "user_id": "u1"}))
            .await
            .unwrap();
        store
            .insert("reviews", json!({"bootcamp_id": "b1", "user_id": "u2"}))
            .await
            .unwrap();

        let duplicate = store
            .insert("reviews", json!({"bootcamp_id": "b1", "user_id": "u1"}))
            .await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn find_applies_filter_sort_window_and_projection() {
        let store = seeded_store().await;
        for (name, cost) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store
                .insert(
                    "bootcamps",
                    json!({"name": name, "average_cost": cost, "housing": cost % 2 == 0}),
                )
                .await
                .unwrap();
        }

        let options = FindOptions {
            projection: vec!["name".to_string()],
            sort: vec![SortKey::descending("average_cost")],
            skip: 1,
            limit: Some(2),
        };
        let results = store
            .find("bootcamps", &json!({"average_cost": {"$gt": 1}}), &options)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "c");
        assert_eq!(results[1]["name"], "b");
        // Projection keeps id and drops unrequested fields.
        assert!(results[0].get("id").is_some());
        assert!(results[0].get("average_cost").is_none());
    }

    #[tokio::test]
    async fn count_ignores_pagination() {
        let store = seeded_store().await;
        for n in 0..7 {
            store
                .insert("bootcamps", json!({"name": format!("b{n}"), "cost": n}))
                .await
                .unwrap();
        }

        let count = store
            .count("bootcamps", &json!({"cost": {"$gte": 3}}))
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn update_merges_shallow_and_null_clears() {
        let store = seeded_store().await;
        let inserted = store
            .insert("bootcamps", json!({"name": "a", "phone": "123"}))
            .await
            .unwrap();
        let id = inserted["id"].as_str().unwrap();

        let updated = store
            .update_by_id("bootcamps", id, &json!({"phone": null, "website": "https://a.dev"}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["name"], "a");
        assert!(updated["phone"].is_null());
        assert_eq!(updated["website"], "https://a.dev");
    }

    #[tokio::test]
    async fn update_cannot_change_id() {
        let store = seeded_store().await;
        let inserted = store
            .insert("bootcamps", json!({"name": "a"}))
            .await
            .unwrap();
        let id = inserted["id"].as_str().unwrap().to_string();

        let updated = store
            .update_by_id("bootcamps", &id, &json!({"id": "other"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], id.as_str());
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let store = seeded_store().await;
        let inserted = store
            .insert("bootcamps", json!({"name": "a"}))
            .await
            .unwrap();
        let id = inserted["id"].as_str().unwrap();

        let removed = store.delete_by_id("bootcamps", id).await.unwrap();
        assert_eq!(removed.unwrap()["name"], "a");

        let gone = store.find_by_id("bootcamps", id).await.unwrap();
        assert!(gone.is_none());

        let again = store.delete_by_id("bootcamps", id).await.unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn project_on_empty_projection_returns_document_unchanged() {
        let doc = json!({"id": "x", "name": "a"});
        assert_eq!(project(doc.clone(), &[]), doc);
    }
}
