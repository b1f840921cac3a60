use serde::{Deserialize, Serialize};

use hail_core::CollectionSnapshot;

/// Path of the cab catalog collection.
pub const CABS_PATH: &str = "cabs";

/// A bookable vehicle listing.
///
/// Reference data: written once by the seeding process and never mutated by
/// the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cab {
    /// Store key, not part of the persisted record.
    #[serde(skip)]
    pub id: String,
    pub company_name: String,
    pub car_model: String,
    pub passengers: u32,
    pub rating: f64,
    pub cost_per_hour: f64,
}

/// Decode a catalog snapshot into the ordered cab list.
///
/// Order follows the snapshot's key order. A record that does not decode is
/// skipped with a warning rather than failing the whole list.
pub fn cabs_from_snapshot(snapshot: &CollectionSnapshot) -> Vec<Cab> {
    snapshot
        .iter()
        .filter_map(
            |(key, value)| match serde_json::from_value::<Cab>(value.clone()) {
                Ok(mut cab) => {
                    cab.id = key.clone();
                    Some(cab)
                }
                Err(err) => {
                    tracing::warn!("skipping malformed cab record {}: {}", key, err);
                    None
                }
            },
        )
        .collect()
}
