//! Store module for persisting crawl state
//!
//! This module holds everything the crawl survives restarts with:
//! - Per-page listing records with their visited flags (the page record store)
//! - Extracted detail payloads (first write wins)
//! - The duplicate-collision ledger
//! - Run bookkeeping for resumption and audit

mod schema;
mod sqlite;
mod traits;

pub use schema::{get_schema_version, initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreError, StoreResult};

use crate::PiseroError;
use std::path::Path;

/// Initializes or opens a store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(PiseroError)` - Failed to open the database
pub fn open_store(path: &Path) -> Result<SqliteStore, PiseroError> {
    SqliteStore::new(path)
}

/// One listing as persisted in the page record store
#[derive(Debug, Clone)]
pub struct ListingRef {
    pub id: String,
    pub page_number: u32,
    pub url: String,
    pub anchor_text: String,
    pub visited: bool,
    pub discovered_at: String,
    pub visited_at: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

/// The extracted content for a visited listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetail {
    pub id: String,
    pub payload: String,
    pub captured_at: String,
}

/// One entry of the duplicate-collision ledger
#[derive(Debug, Clone)]
pub struct DuplicateRecord {
    pub id: String,
    pub url: String,
    pub count: u32,
    pub first_seen: String,
    pub last_seen: String,
}

/// Result of merging one discovery batch into a page
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Ids newly inserted with `visited = false`
    pub inserted: usize,

    /// Ids already on this page, kept untouched
    pub preserved: usize,

    /// Refs whose id is owned by a different page (duplicate candidates)
    pub cross_page: Vec<crate::listing::DiscoveredRef>,
}

/// Per-page progress row for statistics output
#[derive(Debug, Clone)]
pub struct PageSummary {
    pub page_number: u32,
    pub total: u64,
    pub visited: u64,
}

impl PageSummary {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.visited == self.total
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub summary: CrawlSummary,
}

/// Final counters of one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_completed: u64,
    pub listings_visited: u64,
    pub errors: u64,
    pub duplicates_detected: u64,
}

impl std::fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pages completed, {} listings visited, {} errors, {} duplicates",
            self.pages_completed, self.listings_visited, self.errors, self.duplicates_detected
        )
    }
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}
