//! SQLite store implementation
//!
//! This module provides the SQLite-based implementation of the Store trait.

use crate::listing::DiscoveredRef;
use crate::store::schema::initialize_schema;
use crate::store::traits::{Store, StoreError, StoreResult};
use crate::store::{
    CrawlSummary, DuplicateRecord, ListingDetail, ListingRef, MergeOutcome, PageSummary,
    RunRecord, RunStatus,
};
use crate::PiseroError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

/// SQLite store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(PiseroError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, PiseroError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for durability under interruption
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, PiseroError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Total and pending ref counts for one page
    fn page_progress(&self, page: u32) -> StoreResult<(u64, u64)> {
        let (total, pending): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN visited = 0 THEN 1 ELSE 0 END), 0)
             FROM listing_refs WHERE page_number = ?1",
            params![page],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total as u64, pending as u64))
    }
}

const REF_COLUMNS: &str = "id, page_number, url, anchor_text, visited, discovered_at, \
                           visited_at, retry_count, last_error";

fn row_to_ref(row: &Row<'_>) -> rusqlite::Result<ListingRef> {
    let visited_int: i64 = row.get(4)?;
    Ok(ListingRef {
        id: row.get(0)?,
        page_number: row.get(1)?,
        url: row.get(2)?,
        anchor_text: row.get(3)?,
        visited: visited_int != 0,
        discovered_at: row.get(5)?,
        visited_at: row.get(6)?,
        retry_count: row.get(7)?,
        last_error: row.get(8)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        summary: CrawlSummary {
            pages_completed: row.get::<_, i64>(5)? as u64,
            listings_visited: row.get::<_, i64>(6)? as u64,
            errors: row.get::<_, i64>(7)? as u64,
            duplicates_detected: row.get::<_, i64>(8)? as u64,
        },
    })
}

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
                           pages_completed, listings_visited, errors, duplicates_detected";

impl Store for SqliteStore {
    // ===== Run bookkeeping =====

    fn create_run(&mut self, config_hash: &str) -> StoreResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        let run = stmt
            .query_row(params![run_id], row_to_run)
            .map_err(|_| StoreError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn latest_run(&self) -> StoreResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        let run = stmt.query_row([], row_to_run).optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &CrawlSummary,
    ) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_completed = ?3,
             listings_visited = ?4, errors = ?5, duplicates_detected = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                summary.pages_completed as i64,
                summary.listings_visited as i64,
                summary.errors as i64,
                summary.duplicates_detected as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    fn interrupt_stale_runs(&mut self) -> StoreResult<u64> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE status = ?3",
            params![
                RunStatus::Interrupted.to_db_string(),
                now,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(changed as u64)
    }

    // ===== Page records =====

    fn merge_page(&mut self, page: u32, discovered: &[DiscoveredRef]) -> StoreResult<MergeOutcome> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut outcome = MergeOutcome::default();

        for candidate in discovered {
            let owner: Option<u32> = tx
                .query_row(
                    "SELECT page_number FROM listing_refs WHERE id = ?1",
                    params![candidate.id],
                    |row| row.get(0),
                )
                .optional()?;

            match owner {
                // Re-observed on its own page: the stored record wins.
                Some(owner_page) if owner_page == page => outcome.preserved += 1,
                // Owned by another page: collision candidate, not re-stored.
                Some(_) => outcome.cross_page.push(candidate.clone()),
                None => {
                    tx.execute(
                        "INSERT INTO listing_refs (id, page_number, url, anchor_text, visited, discovered_at)
                         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                        params![candidate.id, page, candidate.url, candidate.anchor_text, now],
                    )?;
                    outcome.inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    fn page_refs(&self, page: u32) -> StoreResult<Vec<ListingRef>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM listing_refs WHERE page_number = ?1 ORDER BY rowid",
            REF_COLUMNS
        ))?;

        let refs = stmt
            .query_map(params![page], row_to_ref)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    fn pending_refs(&self, page: u32) -> StoreResult<Vec<ListingRef>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM listing_refs WHERE page_number = ?1 AND visited = 0 ORDER BY rowid",
            REF_COLUMNS
        ))?;

        let refs = stmt
            .query_map(params![page], row_to_ref)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(refs)
    }

    fn pending_ids(&self, page: u32) -> StoreResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM listing_refs WHERE page_number = ?1 AND visited = 0")?;

        let ids = stmt
            .query_map(params![page], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(ids)
    }

    fn get_ref(&self, id: &str) -> StoreResult<Option<ListingRef>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM listing_refs WHERE id = ?1",
            REF_COLUMNS
        ))?;

        let r = stmt.query_row(params![id], row_to_ref).optional()?;

        Ok(r)
    }

    fn mark_visited(&mut self, page: u32, id: &str) -> StoreResult<bool> {
        let now = Utc::now().to_rfc3339();
        // The visited = 0 guard keeps the transition monotonic: a second
        // call can never refresh visited_at, let alone reset the flag.
        let changed = self.conn.execute(
            "UPDATE listing_refs SET visited = 1, visited_at = ?1
             WHERE id = ?2 AND page_number = ?3 AND visited = 0",
            params![now, id, page],
        )?;

        if changed == 1 {
            return Ok(true);
        }

        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listing_refs WHERE id = ?1 AND page_number = ?2",
            params![id, page],
            |row| row.get(0),
        )?;

        if exists == 0 {
            tracing::warn!("mark_visited: page {} does not hold id {}", page, id);
        }

        Ok(false)
    }

    fn is_complete(&self, page: u32) -> StoreResult<bool> {
        let (total, pending) = self.page_progress(page)?;
        Ok(total > 0 && pending == 0)
    }

    fn locate_resume_page(&self) -> StoreResult<u32> {
        let mut page = 1u32;
        loop {
            let (total, pending) = self.page_progress(page)?;
            if total == 0 || pending > 0 {
                return Ok(page);
            }
            page += 1;
        }
    }

    fn record_visit_failure(&mut self, id: &str, error: &str) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE listing_refs SET retry_count = retry_count + 1, last_error = ?1 WHERE id = ?2",
            params![error, id],
        )?;
        Ok(())
    }

    fn clear_crawl_state(&mut self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM listing_refs", [])?;
        Ok(())
    }

    // ===== Listing details =====

    fn insert_detail(&mut self, detail: &ListingDetail) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO listing_details (id, payload, captured_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO NOTHING",
            params![detail.id, detail.payload, detail.captured_at],
        )?;
        Ok(inserted == 1)
    }

    fn get_detail(&self, id: &str) -> StoreResult<Option<ListingDetail>> {
        let detail = self
            .conn
            .query_row(
                "SELECT id, payload, captured_at FROM listing_details WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ListingDetail {
                        id: row.get(0)?,
                        payload: row.get(1)?,
                        captured_at: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(detail)
    }

    // ===== Dedup ledger =====

    fn record_duplicate(&mut self, id: &str, url: &str) -> StoreResult<u32> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO duplicates (id, url, count, first_seen, last_seen)
             VALUES (?1, ?2, 1, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET count = duplicates.count + 1, last_seen = excluded.last_seen",
            params![id, url, now],
        )?;

        let count: u32 = self.conn.query_row(
            "SELECT count FROM duplicates WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    fn get_duplicate(&self, id: &str) -> StoreResult<Option<DuplicateRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, url, count, first_seen, last_seen FROM duplicates WHERE id = ?1",
                params![id],
                |row| {
                    Ok(DuplicateRecord {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        count: row.get(2)?,
                        first_seen: row.get(3)?,
                        last_seen: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    // ===== Statistics =====

    fn count_refs(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listing_refs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_visited(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listing_refs WHERE visited = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_details(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listing_details", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_duplicate_ids(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM duplicates", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn sum_duplicate_collisions(&self) -> StoreResult<u64> {
        let sum: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM duplicates",
            [],
            |row| row.get(0),
        )?;
        Ok(sum as u64)
    }

    fn page_breakdown(&self) -> StoreResult<Vec<PageSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_number, COUNT(*),
                    COALESCE(SUM(CASE WHEN visited = 1 THEN 1 ELSE 0 END), 0)
             FROM listing_refs GROUP BY page_number ORDER BY page_number",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PageSummary {
                    page_number: row.get(0)?,
                    total: row.get::<_, i64>(1)? as u64,
                    visited: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
