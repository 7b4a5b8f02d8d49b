// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store.
//!
//! Documents are kept as JSON values per collection, so every read and write
//! goes through the same serde round trip as the Firestore backend. Used for
//! tests and for running the API without GCP credentials.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

type Collection = BTreeMap<String, Value>;

/// In-memory backend.
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
    /// Collections whose writes fail (fault injection for tests)
    failing_writes: RwLock<HashSet<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `collection` fail until reset.
    pub async fn set_fail_writes(&self, collection: &str, fail: bool) {
        let mut failing = self.failing_writes.write().await;
        if fail {
            failing.insert(collection.to_string());
        } else {
            failing.remove(collection);
        }
    }

    async fn check_writable(&self, collection: &str) -> Result<(), AppError> {
        if self.failing_writes.read().await.contains(collection) {
            return Err(AppError::Database(format!(
                "Write to {} rejected (injected failure)",
                collection
            )));
        }
        Ok(())
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|value| decode(value.clone()))
            .transpose()
    }

    pub async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| docs.values().cloned().map(decode).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Documents whose string field `field` equals `value`.
    pub async fn list_where_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        docs.values()
            .filter(|doc| doc.get(field).and_then(Value::as_str) == Some(value))
            .cloned()
            .map(decode)
            .collect()
    }

    pub async fn set<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        self.check_writable(collection).await?;
        let value = encode(doc)?;

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), value);

        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        self.check_writable(collection).await?;
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    /// Read-modify-write a single document under the collection write lock.
    pub async fn update_with<T, F>(
        &self,
        collection: &str,
        id: &str,
        apply: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Result<T, AppError>,
    {
        self.check_writable(collection).await?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let current = docs.get(id).map(|v| decode(v.clone())).transpose()?;
        let next = apply(current)?;
        docs.insert(id.to_string(), encode(&next)?);

        Ok(next)
    }
}

fn encode<T: Serialize>(doc: &T) -> Result<Value, AppError> {
    serde_json::to_value(doc).map_err(|e| AppError::Database(format!("Encode failed: {}", e)))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Database(format!("Decode failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        owner_id: String,
        n: u32,
    }

    fn doc(owner: &str, n: u32) -> Doc {
        Doc {
            owner_id: owner.to_string(),
            n,
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryBackend::new();
        assert!(store.get::<Doc>("docs", "a").await.unwrap().is_none());

        store.set("docs", "a", &doc("u1", 1)).await.unwrap();
        assert_eq!(store.get::<Doc>("docs", "a").await.unwrap(), Some(doc("u1", 1)));

        assert!(store.delete("docs", "a").await.unwrap());
        assert!(!store.delete("docs", "a").await.unwrap());
        assert!(store.get::<Doc>("docs", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_where_eq_uses_document_field_names() {
        let store = MemoryBackend::new();
        store.set("docs", "a", &doc("u1", 1)).await.unwrap();
        store.set("docs", "b", &doc("u2", 2)).await.unwrap();
        store.set("docs", "c", &doc("u1", 3)).await.unwrap();

        let owned: Vec<Doc> = store.list_where_eq("docs", "ownerId", "u1").await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|d| d.owner_id == "u1"));

        let all: Vec<Doc> = store.list("docs").await.unwrap();
        assert_eq!(all.len(), 3);
        let none: Vec<Doc> = store.list("missing").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_with_rejection_leaves_document() {
        let store = MemoryBackend::new();
        store.set("docs", "a", &doc("u1", 1)).await.unwrap();

        let err = store
            .update_with::<Doc, _>("docs", "a", |_| Err(AppError::Conflict("no".to_string())))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get::<Doc>("docs", "a").await.unwrap(), Some(doc("u1", 1)));

        let next = store
            .update_with::<Doc, _>("docs", "a", |cur| {
                let mut d = cur.unwrap();
                d.n += 1;
                Ok(d)
            })
            .await
            .unwrap();
        assert_eq!(next.n, 2);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = MemoryBackend::new();
        store.set_fail_writes("docs", true).await;
        assert!(matches!(
            store.set("docs", "a", &doc("u1", 1)).await,
            Err(AppError::Database(_))
        ));

        store.set_fail_writes("docs", false).await;
        store.set("docs", "a", &doc("u1", 1)).await.unwrap();
    }
}
