pub mod delta;
pub mod store;

pub use delta::{diff_snapshots, CollectionDelta};
pub use store::{
    record_path, CollectionSnapshot, RealtimeStore, StoreError, StoreResult, StoreSubscription,
    SubscriptionError,
};
