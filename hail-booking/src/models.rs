use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use hail_catalog::Cab;
use hail_core::CollectionSnapshot;

/// Path of the booking ledger collection.
pub const BOOKINGS_PATH: &str = "bookedCabs";

/// Booking lifecycle status. Serializes as the capitalized variant name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "Active",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

/// A reservation against a cab.
///
/// Cab fields are denormalized at creation time; there is no foreign key
/// back into the catalog. Records are never deleted, only re-statused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Store key, assigned on append, not part of the persisted record.
    #[serde(skip)]
    pub id: String,
    pub cab_id: String,
    pub company_name: String,
    pub car_model: String,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    /// New Active booking for `cab`, stamped with the current time.
    pub fn for_cab(cab: &Cab) -> Self {
        Self {
            id: String::new(),
            cab_id: cab.id.clone(),
            company_name: cab.company_name.clone(),
            car_model: cab.car_model.clone(),
            booking_time: Utc::now(),
            status: BookingStatus::Active,
        }
    }

    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Decode a ledger snapshot into the ordered booking list.
///
/// Order follows the snapshot's key order. A record that does not decode is
/// skipped with a warning rather than failing the whole list.
pub fn bookings_from_snapshot(snapshot: &CollectionSnapshot) -> Vec<Booking> {
    snapshot
        .iter()
        .filter_map(
            |(key, value)| match serde_json::from_value::<Booking>(value.clone()) {
                Ok(mut booking) => {
                    booking.id = key.clone();
                    Some(booking)
                }
                Err(err) => {
                    tracing::warn!("skipping malformed booking record {}: {}", key, err);
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_cab() -> Cab {
        Cab {
            id: "cab-001".to_string(),
            company_name: "Swift Cabs".to_string(),
            car_model: "Toyota Prius".to_string(),
            passengers: 4,
            rating: 4.5,
            cost_per_hour: 18.0,
        }
    }

    #[test]
    fn test_status_serializes_as_wire_string() {
        assert_eq!(
            serde_json::to_value(BookingStatus::Active).unwrap(),
            json!("Active")
        );
        assert_eq!(
            serde_json::to_value(BookingStatus::Cancelled).unwrap(),
            json!("Cancelled")
        );
    }

    #[test]
    fn test_booking_record_uses_camel_case_fields() {
        let booking = Booking::for_cab(&sample_cab());
        let record = booking.to_record().unwrap();

        assert_eq!(record["cabId"], json!("cab-001"));
        assert_eq!(record["companyName"], json!("Swift Cabs"));
        assert_eq!(record["carModel"], json!("Toyota Prius"));
        assert_eq!(record["status"], json!("Active"));
        assert!(record.get("bookingTime").is_some());
        // the id lives in the store key, not in the record
        assert!(record.get("id").is_none());
    }

    #[test]
    fn test_booking_time_round_trips_as_same_instant() {
        let booking = Booking::for_cab(&sample_cab());
        let record = booking.to_record().unwrap();

        let mut decoded: Booking = serde_json::from_value(record).unwrap();
        decoded.id = booking.id.clone();
        assert_eq!(decoded.booking_time, booking.booking_time);
        assert_eq!(decoded, booking);
    }
}
