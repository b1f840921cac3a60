use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use hail_catalog::Cab;
use hail_core::{record_path, RealtimeStore, StoreError};

use crate::models::{Booking, BookingStatus, BOOKINGS_PATH};

/// Capacity rule applied before a booking is admitted.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    pub max_active_bookings: usize,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_active_bookings: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking limit reached: {active} active bookings, limit {limit}")]
    CapacityExceeded { active: usize, limit: usize },

    #[error("could not count active bookings: {0}")]
    CapacityCheckFailed(#[source] StoreError),

    #[error("could not persist booking: {0}")]
    PersistFailed(#[source] StoreError),

    #[error("could not encode booking record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Booking admission and lifecycle operations against the shared store.
pub struct BookingService {
    store: Arc<dyn RealtimeStore>,
    policy: AdmissionPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn RealtimeStore>, policy: AdmissionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn active_limit(&self) -> usize {
        self.policy.max_active_bookings
    }

    /// Admit a booking for `cab`.
    ///
    /// The capacity check and the append are two separate store calls, not
    /// one transaction: two concurrent admissions can both observe a count
    /// under the limit and both append.
    pub async fn book(&self, cab: &Cab) -> Result<Booking, BookingError> {
        // 1. Count active bookings
        let active = self
            .store
            .count_eq(BOOKINGS_PATH, "status", &json!(BookingStatus::Active.as_str()))
            .await
            .map_err(BookingError::CapacityCheckFailed)?;

        // 2. Reject at the limit, no write
        if active >= self.policy.max_active_bookings {
            warn!(
                "booking rejected for {}: {} active bookings at limit {}",
                cab.company_name, active, self.policy.max_active_bookings
            );
            return Err(BookingError::CapacityExceeded {
                active,
                limit: self.policy.max_active_bookings,
            });
        }

        // 3. Append the new Active booking
        let mut booking = Booking::for_cab(cab);
        let record = booking.to_record()?;
        booking.id = self
            .store
            .push(BOOKINGS_PATH, record)
            .await
            .map_err(BookingError::PersistFailed)?;

        info!("booked {} ({})", booking.company_name, booking.id);
        Ok(booking)
    }

    /// Overwrite the status of an existing booking.
    ///
    /// Every target status is accepted; there is no lifecycle restriction,
    /// so a Completed booking can go back to Active.
    pub async fn set_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<(), BookingError> {
        self.store
            .update(
                &record_path(BOOKINGS_PATH, booking_id),
                json!({ "status": status.as_str() }),
            )
            .await
            .map_err(BookingError::PersistFailed)?;

        info!("booking {} -> {}", booking_id, status.as_str());
        Ok(())
    }
}
