pub mod admission;
pub mod ledger;
pub mod models;

pub use admission::{AdmissionPolicy, BookingError, BookingService};
pub use ledger::{BookingLedger, LedgerFeed, LedgerListener};
pub use models::{bookings_from_snapshot, Booking, BookingStatus, BOOKINGS_PATH};
