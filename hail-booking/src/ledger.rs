use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use hail_core::{
    diff_snapshots, CollectionDelta, CollectionSnapshot, RealtimeStore, StoreError,
    SubscriptionError,
};

use crate::models::{bookings_from_snapshot, Booking, BookingStatus, BOOKINGS_PATH};

/// Receives booking ledger updates. Implemented by the presentation layer.
pub trait LedgerListener: Send + Sync {
    /// Full ordered booking list plus the keys that changed since the last
    /// delivery.
    fn bookings_changed(&self, bookings: Vec<Booking>, delta: &CollectionDelta);

    /// The live subscription reported an error. Delivery resumes with the
    /// next snapshot unless the store side closed.
    fn subscription_failed(&self, error: &SubscriptionError);
}

/// View model over the booking collection.
///
/// Caches the list last delivered by the feed. A status change confirmed by
/// the store is merged into the cache immediately rather than waiting for
/// the subscription echo; an unconfirmed change is never merged.
pub struct BookingLedger {
    bookings: Mutex<Vec<Booking>>,
    listener: Arc<dyn LedgerListener>,
}

impl BookingLedger {
    pub fn new(listener: Arc<dyn LedgerListener>) -> Self {
        Self {
            bookings: Mutex::new(Vec::new()),
            listener,
        }
    }

    /// Current booking list, in snapshot key order.
    pub fn bookings(&self) -> Vec<Booking> {
        self.lock().clone()
    }

    /// Replace the cache with a fresh snapshot decode and notify.
    pub fn apply_snapshot(&self, bookings: Vec<Booking>, delta: &CollectionDelta) {
        *self.lock() = bookings.clone();
        self.listener.bookings_changed(bookings, delta);
    }

    /// Merge a remotely confirmed status change into the cache.
    ///
    /// A no-op when the booking is unknown locally or already carries the
    /// status, so re-applying the current status leaves the view unchanged.
    pub fn merge_status(&self, booking_id: &str, status: BookingStatus) {
        let updated = {
            let mut bookings = self.lock();
            match bookings
                .iter_mut()
                .find(|booking| booking.id == booking_id && booking.status != status)
            {
                Some(booking) => {
                    booking.status = status;
                    Some(bookings.clone())
                }
                None => None,
            }
        };

        if let Some(bookings) = updated {
            debug!("merged status {} for booking {}", status.as_str(), booking_id);
            let delta = CollectionDelta {
                changed: vec![booking_id.to_string()],
                ..CollectionDelta::default()
            };
            self.listener.bookings_changed(bookings, &delta);
        }
    }

    fn subscription_failed(&self, error: &SubscriptionError) {
        self.listener.subscription_failed(error);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Booking>> {
        self.bookings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live ledger view: pumps `bookedCabs` snapshots into a ledger until closed.
pub struct LedgerFeed {
    handle: JoinHandle<()>,
}

impl LedgerFeed {
    /// Subscribe to the booking collection and start delivering. The
    /// snapshot current at subscribe time (possibly empty) is delivered
    /// first.
    pub async fn spawn(
        store: Arc<dyn RealtimeStore>,
        ledger: Arc<BookingLedger>,
    ) -> Result<Self, StoreError> {
        let mut subscription = store.subscribe(BOOKINGS_PATH).await?;

        let handle = tokio::spawn(async move {
            let mut last = CollectionSnapshot::new();
            let mut first = true;
            loop {
                match subscription.next().await {
                    Ok(snapshot) => {
                        let delta = diff_snapshots(&last, &snapshot);
                        if first || !delta.is_empty() {
                            let bookings = bookings_from_snapshot(&snapshot);
                            debug!(
                                added = delta.added.len(),
                                changed = delta.changed.len(),
                                removed = delta.removed.len(),
                                "ledger snapshot: {} bookings",
                                bookings.len()
                            );
                            ledger.apply_snapshot(bookings, &delta);
                        }
                        last = snapshot;
                        first = false;
                    }
                    Err(error) => {
                        ledger.subscription_failed(&error);
                        if error == SubscriptionError::Closed {
                            info!("ledger subscription closed, feed stopping");
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

impl Drop for LedgerFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
