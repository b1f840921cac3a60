use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, warn};

use hail_booking::{BookingError, BookingService};
use hail_catalog::{Cab, CatalogListener};
use hail_core::{CollectionDelta, SubscriptionError};

use crate::notify::Notifier;
use crate::state::AppState;

/// Catalog screen: the live cab list, the detail view, and the booking flow.
///
/// Implements `CatalogListener`, so the same value handed to
/// `CatalogFeed::spawn` is the screen itself.
pub struct HomeScreen {
    booking: BookingService,
    notifier: Arc<dyn Notifier>,
    cabs: Mutex<Vec<Cab>>,
    selected: Mutex<Option<Cab>>,
}

impl HomeScreen {
    pub fn new(state: &AppState, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self {
            booking: BookingService::new(state.store.clone(), state.policy),
            notifier,
            cabs: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
        })
    }

    /// Current catalog, in the order the feed delivered it.
    pub fn cabs(&self) -> Vec<Cab> {
        lock(&self.cabs).clone()
    }

    /// Open the detail view for `cab`.
    pub fn open_detail(&self, cab: Cab) {
        *lock(&self.selected) = Some(cab);
    }

    pub fn close_detail(&self) {
        *lock(&self.selected) = None;
    }

    pub fn selected_cab(&self) -> Option<Cab> {
        lock(&self.selected).clone()
    }

    /// Book the cab open in the detail view.
    ///
    /// Returns whether the booking was admitted. Every outcome is also
    /// surfaced through the notifier; a successful booking closes the
    /// detail view.
    pub async fn book_selected(&self) -> bool {
        // 1. Need an open detail view
        let cab = match self.selected_cab() {
            Some(cab) => cab,
            None => return false,
        };

        // 2. Run admission and surface the outcome
        match self.booking.book(&cab).await {
            Ok(_booking) => {
                self.notifier.notify(
                    "Booking Successful",
                    &format!("You have booked {}", cab.company_name),
                );
                self.close_detail();
                true
            }
            Err(BookingError::CapacityExceeded { limit, .. }) => {
                self.notifier.notify(
                    "Booking Limit Reached",
                    &format!(
                        "You can only have {} active bookings at a time. \
                         Please cancel an existing booking to make a new one.",
                        limit
                    ),
                );
                false
            }
            Err(err @ BookingError::CapacityCheckFailed(_)) => {
                error!("error checking active bookings: {}", err);
                self.notifier
                    .notify("Error", "Unable to check current bookings. Please try again.");
                false
            }
            Err(err) => {
                error!("error booking cab: {}", err);
                self.notifier.notify(
                    "Booking Failed",
                    "There was an error while booking the cab. Please try again.",
                );
                false
            }
        }
    }
}

impl CatalogListener for HomeScreen {
    fn cabs_changed(&self, cabs: Vec<Cab>, _delta: &CollectionDelta) {
        *lock(&self.cabs) = cabs;
    }

    fn subscription_failed(&self, error: &SubscriptionError) {
        warn!("catalog subscription failed: {}", error);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
