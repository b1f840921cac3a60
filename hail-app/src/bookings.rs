use std::sync::Arc;

use tracing::error;

use hail_booking::{Booking, BookingLedger, BookingService, BookingStatus, LedgerListener};

use crate::notify::Notifier;
use crate::state::AppState;

/// Booked-cabs screen: the live booking ledger and manual status changes.
pub struct BookedCabsScreen {
    booking: BookingService,
    ledger: Arc<BookingLedger>,
    notifier: Arc<dyn Notifier>,
}

impl BookedCabsScreen {
    pub fn new(
        state: &AppState,
        listener: Arc<dyn LedgerListener>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            booking: BookingService::new(state.store.clone(), state.policy),
            ledger: Arc::new(BookingLedger::new(listener)),
            notifier,
        }
    }

    /// The ledger backing this screen; hand it to `LedgerFeed::spawn`.
    pub fn ledger(&self) -> Arc<BookingLedger> {
        self.ledger.clone()
    }

    /// Current booking list, in the order the feed delivered it.
    pub fn bookings(&self) -> Vec<Booking> {
        self.ledger.bookings()
    }

    /// Move a booking to `status` at the user's request.
    ///
    /// The cached view is only touched after the store confirms the write; a
    /// failed update leaves both the record and the view unchanged.
    pub async fn change_status(&self, booking_id: &str, status: BookingStatus) -> bool {
        match self.booking.set_status(booking_id, status).await {
            Ok(()) => {
                self.ledger.merge_status(booking_id, status);
                self.notifier.notify(
                    "Success",
                    &format!("Booking status updated to {}", status.as_str()),
                );
                true
            }
            Err(err) => {
                error!("error updating booking status: {}", err);
                self.notifier
                    .notify("Error", "Failed to update booking status. Please try again.");
                false
            }
        }
    }
}
