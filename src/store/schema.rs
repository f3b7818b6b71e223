//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the pisero database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl runs and their final counters
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_completed INTEGER NOT NULL DEFAULT 0,
    listings_visited INTEGER NOT NULL DEFAULT 0,
    errors INTEGER NOT NULL DEFAULT 0,
    duplicates_detected INTEGER NOT NULL DEFAULT 0
);

-- One row per discovered listing, keyed by the derived listing id.
-- The id is globally unique: a listing belongs to the page where it was
-- first observed.
CREATE TABLE IF NOT EXISTS listing_refs (
    id TEXT PRIMARY KEY,
    page_number INTEGER NOT NULL,
    url TEXT NOT NULL,
    anchor_text TEXT NOT NULL DEFAULT '',
    visited INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    visited_at TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    last_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_listing_refs_page ON listing_refs(page_number);
CREATE INDEX IF NOT EXISTS idx_listing_refs_page_visited ON listing_refs(page_number, visited);

-- Extracted detail payloads; first write wins, later writes are no-ops.
-- Deliberately no foreign key to listing_refs: details outlive a --fresh
-- wipe of the crawl state.
CREATE TABLE IF NOT EXISTS listing_details (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

-- Collision ledger for ids observed again after their first sighting.
-- Rows are never deleted.
CREATE TABLE IF NOT EXISTS duplicates (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    count INTEGER NOT NULL,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
///
/// This can be used for future migrations if the schema changes.
pub fn get_schema_version() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Initialize twice
        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        // Should succeed the second time too
        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables = vec!["runs", "listing_refs", "listing_details", "duplicates"];

        for table in tables {
            let count: Result<i64, _> = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='{}'",
                    table
                ),
                [],
                |row| row.get(0),
            );
            assert!(count.is_ok());
            assert_eq!(count.unwrap(), 1, "Table {} should exist", table);
        }
    }
}
