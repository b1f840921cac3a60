use std::sync::Arc;

use hail_booking::AdmissionPolicy;
use hail_core::RealtimeStore;

/// Shared handles injected into every screen.
///
/// The store is passed explicitly rather than living in process-wide
/// singleton state; constructing a second `AppState` over a second store is
/// how tests isolate themselves.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RealtimeStore>,
    pub policy: AdmissionPolicy,
}
