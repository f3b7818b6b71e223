//! Output module for reporting persisted crawl state

mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
