use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// Whole-collection snapshot as delivered by the store on every change.
///
/// Keys are store-assigned record ids. Consumers iterate in the map's key
/// order, which is not insertion or chronological order.
pub type CollectionSnapshot = BTreeMap<String, Value>;

/// Path of a single record inside a collection.
pub fn record_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, id)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no record at {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("store operation failed: {0}")]
    OperationFailed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced on a live subscription, separate from the data channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("subscription fell behind, {skipped} snapshots dropped")]
    Lagged { skipped: u64 },

    #[error("store side of the subscription closed")]
    Closed,
}

/// Live handle on a collection path. Dropping it unregisters the listener.
pub struct StoreSubscription {
    initial: Option<CollectionSnapshot>,
    receiver: broadcast::Receiver<CollectionSnapshot>,
}

impl StoreSubscription {
    pub fn new(
        initial: CollectionSnapshot,
        receiver: broadcast::Receiver<CollectionSnapshot>,
    ) -> Self {
        Self {
            initial: Some(initial),
            receiver,
        }
    }

    /// Wait for the next whole-collection snapshot.
    ///
    /// The snapshot current at subscribe time is delivered first, so an
    /// empty collection yields an empty snapshot rather than nothing. After
    /// a `Lagged` error the next call resumes with the oldest retained
    /// snapshot; after `Closed` no further snapshots will arrive.
    pub async fn next(&mut self) -> Result<CollectionSnapshot, SubscriptionError> {
        if let Some(snapshot) = self.initial.take() {
            return Ok(snapshot);
        }
        match self.receiver.recv().await {
            Ok(snapshot) => Ok(snapshot),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                Err(SubscriptionError::Lagged { skipped })
            }
            Err(broadcast::error::RecvError::Closed) => Err(SubscriptionError::Closed),
        }
    }
}

/// The realtime document store seam.
///
/// Collections hold keyed JSON records; every mutation re-delivers the full
/// collection to all subscribers. Nothing else is assumed of the store: no
/// transactions, no indexes beyond one-field equality counting.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Replace the whole value at `path`.
    async fn put(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Append `value` under `path`; the store assigns and returns the key.
    async fn push(&self, path: &str, value: Value) -> StoreResult<String>;

    /// Merge the fields of `patch` into the record at `path`.
    async fn update(&self, path: &str, patch: Value) -> StoreResult<()>;

    /// Count records in `path` whose `field` equals `value`.
    async fn count_eq(&self, path: &str, field: &str, value: &Value) -> StoreResult<usize>;

    /// Register for snapshot delivery on `path`.
    async fn subscribe(&self, path: &str) -> StoreResult<StoreSubscription>;
}
