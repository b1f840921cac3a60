pub mod bookings;
pub mod home;
pub mod notify;
pub mod state;

pub use bookings::BookedCabsScreen;
pub use home::HomeScreen;
pub use notify::{Notifier, TracingNotifier};
pub use state::AppState;
