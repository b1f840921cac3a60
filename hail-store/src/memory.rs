use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use hail_core::{
    CollectionSnapshot, RealtimeStore, StoreError, StoreResult, StoreSubscription,
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

struct Collection {
    records: CollectionSnapshot,
    snapshots: broadcast::Sender<CollectionSnapshot>,
}

impl Collection {
    fn new() -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            records: CollectionSnapshot::new(),
            snapshots,
        }
    }

    fn publish(&self) {
        // send fails only when no subscription is live
        let _ = self.snapshots.send(self.records.clone());
    }
}

/// In-process realtime store.
///
/// Each collection is a keyed record map; every mutation re-broadcasts the
/// full collection to all live subscriptions, which is the delivery model
/// the rest of the system is written against. Paths are `collection` or
/// `collection/{id}`.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn split_path(path: &str) -> StoreResult<(String, Option<String>)> {
        let mut parts = path.split('/').filter(|part| !part.is_empty());
        let collection = parts
            .next()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        let id = parts.next();
        if parts.next().is_some() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok((collection.to_string(), id.map(str::to_string)))
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, HashMap<String, Collection>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<String, Collection>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn put(&self, path: &str, value: Value) -> StoreResult<()> {
        let (name, id) = Self::split_path(path)?;
        let mut collections = self.write_lock();
        let collection = collections.entry(name).or_insert_with(Collection::new);

        match id {
            Some(id) => {
                collection.records.insert(id, value);
            }
            None => {
                // Whole-collection replace. Arrays land as integer-keyed
                // records, matching how the hosted store stores them.
                collection.records = match value {
                    Value::Object(map) => map.into_iter().collect(),
                    Value::Array(items) => items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| (index.to_string(), item))
                        .collect(),
                    other => {
                        return Err(StoreError::OperationFailed(format!(
                            "whole-collection put at {} needs an object or array, got {}",
                            path, other
                        )))
                    }
                };
            }
        }

        collection.publish();
        info!("put {}", path);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> StoreResult<String> {
        let (name, id) = Self::split_path(path)?;
        if id.is_some() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let key = Uuid::new_v4().to_string();
        let mut collections = self.write_lock();
        let collection = collections.entry(name).or_insert_with(Collection::new);
        collection.records.insert(key.clone(), value);
        collection.publish();
        info!("pushed {} -> {}", path, key);
        Ok(key)
    }

    async fn update(&self, path: &str, patch: Value) -> StoreResult<()> {
        let (name, id) = Self::split_path(path)?;
        let id = id.ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::OperationFailed(format!(
                    "update at {} needs an object patch",
                    path
                )))
            }
        };

        let mut collections = self.write_lock();
        let collection = collections
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let record = collection
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        match record.as_object_mut() {
            Some(fields) => {
                for (field, value) in patch {
                    fields.insert(field, value);
                }
            }
            None => {
                return Err(StoreError::OperationFailed(format!(
                    "record at {} is not an object",
                    path
                )))
            }
        }

        collection.publish();
        debug!("updated {}", path);
        Ok(())
    }

    async fn count_eq(&self, path: &str, field: &str, value: &Value) -> StoreResult<usize> {
        let (name, id) = Self::split_path(path)?;
        if id.is_some() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let collections = self.read_lock();
        let count = collections
            .get(&name)
            .map(|collection| {
                collection
                    .records
                    .values()
                    .filter(|record| record.get(field) == Some(value))
                    .count()
            })
            .unwrap_or(0);
        Ok(count)
    }

    async fn subscribe(&self, path: &str) -> StoreResult<StoreSubscription> {
        let (name, id) = Self::split_path(path)?;
        if id.is_some() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        // Snapshot and receiver are taken under the same lock so no
        // mutation can slip between them.
        let mut collections = self.write_lock();
        let collection = collections.entry(name).or_insert_with(Collection::new);
        Ok(StoreSubscription::new(
            collection.records.clone(),
            collection.snapshots.subscribe(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_assigns_key_and_stores_record() {
        let store = MemoryStore::new();
        let key = store
            .push("bookedCabs", json!({"status": "Active"}))
            .await
            .unwrap();

        let mut subscription = store.subscribe("bookedCabs").await.unwrap();
        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&key), Some(&json!({"status": "Active"})));
    }

    #[tokio::test]
    async fn test_subscribe_to_empty_collection_yields_empty_snapshot() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe("cabs").await.unwrap();
        let snapshot = subscription.next().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_receives_later_writes() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe("cabs").await.unwrap();
        assert!(subscription.next().await.unwrap().is_empty());

        store
            .put("cabs/cab-001", json!({"companyName": "Swift Cabs"}))
            .await
            .unwrap();

        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("cab-001"));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let key = store
            .push("bookedCabs", json!({"status": "Active", "carModel": "Prius"}))
            .await
            .unwrap();

        store
            .update(
                &format!("bookedCabs/{}", key),
                json!({"status": "Completed"}),
            )
            .await
            .unwrap();

        let mut subscription = store.subscribe("bookedCabs").await.unwrap();
        let snapshot = subscription.next().await.unwrap();
        assert_eq!(
            snapshot.get(&key),
            Some(&json!({"status": "Completed", "carModel": "Prius"}))
        );
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        store.push("bookedCabs", json!({"status": "Active"})).await.unwrap();

        let result = store
            .update("bookedCabs/no-such-id", json!({"status": "Cancelled"}))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_count_eq_filters_one_field() {
        let store = MemoryStore::new();
        store.push("bookedCabs", json!({"status": "Active"})).await.unwrap();
        store.push("bookedCabs", json!({"status": "Completed"})).await.unwrap();
        store.push("bookedCabs", json!({"status": "Active"})).await.unwrap();

        let active = store
            .count_eq("bookedCabs", "status", &json!("Active"))
            .await
            .unwrap();
        assert_eq!(active, 2);

        let missing = store
            .count_eq("rides", "status", &json!("Active"))
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn test_whole_collection_put_accepts_arrays() {
        let store = MemoryStore::new();
        store
            .put("cabs", json!([{"companyName": "A"}, {"companyName": "B"}]))
            .await
            .unwrap();

        let mut subscription = store.subscribe("cabs").await.unwrap();
        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot.get("0"), Some(&json!({"companyName": "A"})));
        assert_eq!(snapshot.get("1"), Some(&json!({"companyName": "B"})));
    }

    #[tokio::test]
    async fn test_nested_paths_are_rejected() {
        let store = MemoryStore::new();
        let result = store
            .update("bookedCabs/id/status", json!("Active"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }
}
