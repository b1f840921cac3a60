use serde_json::json;
use tracing::info;

use hail_core::{RealtimeStore, StoreResult};

use crate::cab::CABS_PATH;

/// Write the demo catalog, replacing whatever is at `cabs`.
///
/// Bookings are never seeded; they only come from admission.
pub async fn seed_catalog(store: &dyn RealtimeStore) -> StoreResult<()> {
    let cabs = json!({
        "cab-001": {
            "companyName": "Swift Cabs",
            "carModel": "Toyota Prius",
            "passengers": 4,
            "rating": 4.5,
            "costPerHour": 18.0
        },
        "cab-002": {
            "companyName": "City Ride",
            "carModel": "Honda City",
            "passengers": 4,
            "rating": 4.2,
            "costPerHour": 15.5
        },
        "cab-003": {
            "companyName": "Metro Wheels",
            "carModel": "Maruti Ertiga",
            "passengers": 6,
            "rating": 4.0,
            "costPerHour": 21.0
        },
        "cab-004": {
            "companyName": "Night Owl",
            "carModel": "Hyundai Verna",
            "passengers": 4,
            "rating": 4.7,
            "costPerHour": 19.5
        },
        "cab-005": {
            "companyName": "Green Go",
            "carModel": "Tata Tigor EV",
            "passengers": 4,
            "rating": 4.3,
            "costPerHour": 14.0
        }
    });

    store.put(CABS_PATH, cabs).await?;
    info!("catalog seeded");
    Ok(())
}
