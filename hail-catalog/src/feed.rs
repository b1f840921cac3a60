use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use hail_core::{
    diff_snapshots, CollectionDelta, CollectionSnapshot, RealtimeStore, StoreError,
    SubscriptionError,
};

use crate::cab::{cabs_from_snapshot, Cab, CABS_PATH};

/// Receives catalog updates. Implemented by the presentation layer.
pub trait CatalogListener: Send + Sync {
    /// Full ordered cab list plus the keys that changed since the last
    /// delivery.
    fn cabs_changed(&self, cabs: Vec<Cab>, delta: &CollectionDelta);

    /// The live subscription reported an error. Delivery resumes with the
    /// next snapshot unless the store side closed.
    fn subscription_failed(&self, error: &SubscriptionError);
}

/// Live catalog view: pumps `cabs` snapshots into a listener until closed.
pub struct CatalogFeed {
    handle: JoinHandle<()>,
}

impl CatalogFeed {
    /// Subscribe to the catalog and start delivering. The snapshot current
    /// at subscribe time (possibly empty) is delivered first.
    pub async fn spawn(
        store: Arc<dyn RealtimeStore>,
        listener: Arc<dyn CatalogListener>,
    ) -> Result<Self, StoreError> {
        let mut subscription = store.subscribe(CABS_PATH).await?;

        let handle = tokio::spawn(async move {
            let mut last = CollectionSnapshot::new();
            let mut first = true;
            loop {
                match subscription.next().await {
                    Ok(snapshot) => {
                        let delta = diff_snapshots(&last, &snapshot);
                        if first || !delta.is_empty() {
                            let cabs = cabs_from_snapshot(&snapshot);
                            debug!(
                                added = delta.added.len(),
                                changed = delta.changed.len(),
                                removed = delta.removed.len(),
                                "catalog snapshot: {} cabs",
                                cabs.len()
                            );
                            listener.cabs_changed(cabs, &delta);
                        }
                        last = snapshot;
                        first = false;
                    }
                    Err(error) => {
                        listener.subscription_failed(&error);
                        if error == SubscriptionError::Closed {
                            info!("catalog subscription closed, feed stopping");
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self { handle })
    }

    /// Tear the feed down and release the subscription.
    pub fn close(&self) {
        self.handle.abort();
    }
}

impl Drop for CatalogFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hail_store::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingListener {
        deliveries: Mutex<Vec<(Vec<Cab>, CollectionDelta)>>,
        errors: Mutex<Vec<SubscriptionError>>,
    }

    impl CatalogListener for RecordingListener {
        fn cabs_changed(&self, cabs: Vec<Cab>, delta: &CollectionDelta) {
            self.deliveries
                .lock()
                .unwrap()
                .push((cabs, delta.clone()));
        }

        fn subscription_failed(&self, error: &SubscriptionError) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_feed_delivers_empty_list_for_empty_collection() {
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
        let listener = Arc::new(RecordingListener::default());

        let _feed = CatalogFeed::spawn(store.clone(), listener.clone())
            .await
            .unwrap();
        settle().await;

        let deliveries = listener.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].0.is_empty());
        assert!(listener.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_delivers_additions_with_delta() {
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
        let listener = Arc::new(RecordingListener::default());
        let _feed = CatalogFeed::spawn(store.clone(), listener.clone())
            .await
            .unwrap();
        settle().await;

        store
            .put(
                "cabs/cab-001",
                json!({"companyName": "Swift Cabs", "carModel": "Toyota Prius", "passengers": 4, "rating": 4.5, "costPerHour": 18.0}),
            )
            .await
            .unwrap();
        settle().await;

        let deliveries = listener.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 2);
        let (cabs, delta) = &deliveries[1];
        assert_eq!(cabs.len(), 1);
        assert_eq!(cabs[0].id, "cab-001");
        assert_eq!(delta.added, vec!["cab-001".to_string()]);
    }

    #[tokio::test]
    async fn test_closed_feed_stops_delivering() {
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
        let listener = Arc::new(RecordingListener::default());
        let feed = CatalogFeed::spawn(store.clone(), listener.clone())
            .await
            .unwrap();
        settle().await;

        feed.close();
        settle().await;
        store
            .put("cabs/cab-001", json!({"companyName": "Swift Cabs", "carModel": "m", "passengers": 4, "rating": 4.0, "costPerHour": 10.0}))
            .await
            .unwrap();
        settle().await;

        let deliveries = listener.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
    }
}
