use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hail_app::{AppState, BookedCabsScreen, HomeScreen, TracingNotifier};
use hail_booking::{AdmissionPolicy, Booking, LedgerFeed, LedgerListener};
use hail_catalog::{seed_catalog, CatalogFeed};
use hail_core::{CollectionDelta, RealtimeStore, SubscriptionError};
use hail_store::{app_config::Config, MemoryStore};

/// Headless stand-in for the booked-cabs list view.
struct LedgerLog;

impl LedgerListener for LedgerLog {
    fn bookings_changed(&self, bookings: Vec<Booking>, _delta: &CollectionDelta) {
        tracing::info!("booked cabs: {}", bookings.len());
    }

    fn subscription_failed(&self, error: &SubscriptionError) {
        tracing::error!("booked cabs subscription failed: {}", error);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hail_app=debug,hail_booking=info,hail_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("starting hail against {}", config.store.database_url);

    let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref()).await?;

    let state = AppState {
        store: store.clone(),
        policy: AdmissionPolicy {
            max_active_bookings: config.business_rules.max_active_bookings,
        },
    };

    let notifier = Arc::new(TracingNotifier);
    let home = HomeScreen::new(&state, notifier.clone());
    let _catalog_feed = CatalogFeed::spawn(store.clone(), home.clone()).await?;

    let booked = BookedCabsScreen::new(&state, Arc::new(LedgerLog), notifier);
    let _ledger_feed = LedgerFeed::spawn(store, booked.ledger()).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
