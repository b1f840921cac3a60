pub mod cab;
pub mod feed;
pub mod seed;

pub use cab::{cabs_from_snapshot, Cab, CABS_PATH};
pub use feed::{CatalogFeed, CatalogListener};
pub use seed::seed_catalog;
