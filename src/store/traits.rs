//! Store trait and error types
//!
//! This module defines the trait interface for the page record store and
//! associated error types.

use crate::listing::DiscoveredRef;
use crate::store::{
    CrawlSummary, DuplicateRecord, ListingDetail, ListingRef, MergeOutcome, PageSummary,
    RunRecord, RunStatus,
};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for page-record store backends
///
/// All mutating operations are atomic read-modify-write: callers share one
/// store handle behind a lock and never touch the underlying tables
/// directly.
pub trait Store {
    // ===== Run bookkeeping =====

    /// Creates a new crawl run in `running` state, returning its id
    fn create_run(&mut self, config_hash: &str) -> StoreResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord>;

    /// Gets the most recent run
    fn latest_run(&self) -> StoreResult<Option<RunRecord>>;

    /// Finishes a run: sets its terminal status, timestamp, and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &CrawlSummary,
    ) -> StoreResult<()>;

    /// Flips leftover `running` runs to `interrupted`; returns how many.
    /// Called at startup so a crash leaves no run row open forever.
    fn interrupt_stale_runs(&mut self) -> StoreResult<u64>;

    // ===== Page records =====

    /// Merges a discovery batch into a page's record set.
    ///
    /// An id already stored on this page keeps its existing record
    /// (discovered data never overwrites persisted state). An id owned by a
    /// different page is reported as a cross-page collision and not
    /// inserted. A new id is inserted with `visited = false`. Stored ids
    /// absent from the batch are retained. Idempotent over the stored page
    /// state.
    fn merge_page(&mut self, page: u32, discovered: &[DiscoveredRef]) -> StoreResult<MergeOutcome>;

    /// All refs stored for a page, in discovery order
    fn page_refs(&self, page: u32) -> StoreResult<Vec<ListingRef>>;

    /// Refs on a page still awaiting a successful detail visit
    fn pending_refs(&self, page: u32) -> StoreResult<Vec<ListingRef>>;

    /// Ids on a page with `visited = false`
    fn pending_ids(&self, page: u32) -> StoreResult<HashSet<String>>;

    /// Looks up a single ref by id
    fn get_ref(&self, id: &str) -> StoreResult<Option<ListingRef>>;

    /// Sets `visited = true` and stamps `visited_at`.
    ///
    /// Returns true when the flag actually transitioned. Already-visited
    /// ids are silent no-ops; absent ids are no-ops logged as a warning
    /// (an absent id means something upstream is inconsistent).
    fn mark_visited(&mut self, page: u32, id: &str) -> StoreResult<bool>;

    /// True iff the page's record set is non-empty and fully visited
    fn is_complete(&self, page: u32) -> StoreResult<bool>;

    /// First page, scanning from 1, with no record set or an incomplete one
    fn locate_resume_page(&self) -> StoreResult<u32>;

    /// Bumps `retry_count` and records the error text on a ref
    fn record_visit_failure(&mut self, id: &str, error: &str) -> StoreResult<()>;

    /// Deletes all listing refs. Details and the duplicate ledger survive.
    fn clear_crawl_state(&mut self) -> StoreResult<()>;

    // ===== Listing details =====

    /// Persists a detail payload. Returns false (no-op) if the id already
    /// has one; the stored payload is never replaced.
    fn insert_detail(&mut self, detail: &ListingDetail) -> StoreResult<bool>;

    /// Reads a stored detail payload
    fn get_detail(&self, id: &str) -> StoreResult<Option<ListingDetail>>;

    // ===== Dedup ledger =====

    /// Records a collision for an id. First collision inserts `count = 1`;
    /// later ones increment and refresh `last_seen`. Returns the new count.
    fn record_duplicate(&mut self, id: &str, url: &str) -> StoreResult<u32>;

    /// Reads a ledger entry
    fn get_duplicate(&self, id: &str) -> StoreResult<Option<DuplicateRecord>>;

    // ===== Statistics =====

    /// Total listing refs across all pages
    fn count_refs(&self) -> StoreResult<u64>;

    /// Listing refs with `visited = true`
    fn count_visited(&self) -> StoreResult<u64>;

    /// Stored detail payloads
    fn count_details(&self) -> StoreResult<u64>;

    /// Distinct ids in the duplicate ledger
    fn count_duplicate_ids(&self) -> StoreResult<u64>;

    /// Sum of collision counts across the ledger
    fn sum_duplicate_collisions(&self) -> StoreResult<u64>;

    /// Per-page totals in page order
    fn page_breakdown(&self) -> StoreResult<Vec<PageSummary>>;
}
