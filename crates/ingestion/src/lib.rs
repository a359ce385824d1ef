//! Discovery and loading of collector order-book CSV files.
//!
//! This crate handles:
//! - Catalog scans with header sniffing and a denylist
//! - Full loads into typed rows with per-field parse failures
//! - Snapshot key discovery
//! - A clock-driven read-through cache in front of both

pub mod cache;
pub mod catalog;
pub mod loader;
pub mod source;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use catalog::{CsvCatalog, OrderBookFile};
pub use loader::{OrderBookLoader, Table};
pub use source::DepthSource;
