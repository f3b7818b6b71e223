//! Statistics generation from the crawl store
//!
//! This module provides functionality for extracting and displaying
//! the persisted crawl state: per-page progress, the resume point,
//! capture counts, and the duplicate ledger.

use crate::store::{PageSummary, RunRecord, Store};
use crate::PiseroError;

/// Snapshot of everything the store knows
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Listings discovered across all pages
    pub total_listings: u64,

    /// Listings with a captured detail
    pub visited_listings: u64,

    /// Stored detail payloads
    pub stored_details: u64,

    /// Ids that collided at least once
    pub duplicate_ids: u64,

    /// Total collisions across all ids
    pub duplicate_collisions: u64,

    /// Page a restarted crawl would begin at
    pub resume_page: u32,

    /// Per-page discovery/visit counts, in page order
    pub pages: Vec<PageSummary>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from the store
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(PiseroError)` - Failed to query the store
pub fn load_statistics(store: &dyn Store) -> Result<StoreStatistics, PiseroError> {
    Ok(StoreStatistics {
        total_listings: store.count_refs()?,
        visited_listings: store.count_visited()?,
        stored_details: store.count_details()?,
        duplicate_ids: store.count_duplicate_ids()?,
        duplicate_collisions: store.sum_duplicate_collisions()?,
        resume_page: store.locate_resume_page()?,
        pages: store.page_breakdown()?,
        latest_run: store.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Crawl State ===\n");

    let visited_pct = if stats.total_listings > 0 {
        (stats.visited_listings as f64 / stats.total_listings as f64) * 100.0
    } else {
        0.0
    };

    println!("Listings:");
    println!("  Discovered: {}", stats.total_listings);
    println!(
        "  Visited: {} ({:.1}%)",
        stats.visited_listings, visited_pct
    );
    println!(
        "  Pending: {}",
        stats.total_listings.saturating_sub(stats.visited_listings)
    );
    println!("  Details stored: {}", stats.stored_details);
    println!();

    if !stats.pages.is_empty() {
        println!("Pages:");
        for page in &stats.pages {
            let marker = if page.is_complete() { " (complete)" } else { "" };
            println!(
                "  page {}: {}/{}{}",
                page.page_number, page.visited, page.total, marker
            );
        }
        println!();
    }

    println!("Resume point: page {}", stats.resume_page);
    println!();

    if stats.duplicate_ids > 0 {
        println!("Duplicates:");
        println!("  Ids seen on more than one page: {}", stats.duplicate_ids);
        println!("  Collisions recorded: {}", stats.duplicate_collisions);
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run #{} ({}):", run.id, run.status);
            println!("  Started: {}", run.started_at);
            match &run.finished_at {
                Some(finished) => println!("  Finished: {}", finished),
                None => println!("  Finished: still running"),
            }
            println!("  {}", run.summary);
        }
        None => println!("No runs recorded yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::DiscoveredRef;
    use crate::store::SqliteStore;

    #[test]
    fn test_load_statistics_from_store() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .merge_page(
                1,
                &[
                    DiscoveredRef::new("a/1", "https://example.com/a/1", "A"),
                    DiscoveredRef::new("b/2", "https://example.com/b/2", "B"),
                ],
            )
            .unwrap();
        store.mark_visited(1, "a/1").unwrap();
        store
            .record_duplicate("a/1", "https://example.com/a/1")
            .unwrap();

        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_listings, 2);
        assert_eq!(stats.visited_listings, 1);
        assert_eq!(stats.stored_details, 0);
        assert_eq!(stats.duplicate_ids, 1);
        assert_eq!(stats.duplicate_collisions, 1);
        assert_eq!(stats.resume_page, 1);
        assert_eq!(stats.pages.len(), 1);
        assert!(stats.latest_run.is_none());
    }

    #[test]
    fn test_statistics_on_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_listings, 0);
        assert_eq!(stats.resume_page, 1);
        assert!(stats.pages.is_empty());
    }
}
