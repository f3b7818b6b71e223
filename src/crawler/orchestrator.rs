//! Crawl orchestration - the page-by-page state machine
//!
//! This module drives the whole traversal:
//! - Locating the resume point so restarts never skip or repeat a page
//! - Discovering each results page and merging its listings into the store
//! - Draining each page sweep by sweep until no listing is pending
//! - Visiting detail pages with bounded retry and recording the outcome
//! - Honoring a clean-stop signal between visits
//!
//! A page only counts as complete when every listing discovered on it has
//! a captured detail; anything less stays pending and a later run picks it
//! up from the store.

use crate::config::Config;
use crate::crawler::client::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
use crate::crawler::extract::Extractor;
use crate::crawler::frontier::{PagePhase, PageProgress};
use crate::crawler::pacing::HumanPacing;
use crate::crawler::retry::{retry_with_backoff, Attempt, RetryError, RetryPolicy};
use crate::listing::DiscoveredRef;
use crate::store::{
    CrawlSummary, ListingDetail, ListingRef, RunStatus, SqliteStore, Store, StoreError,
};
use crate::{ConfigError, PiseroError};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use url::Url;

/// Seed-file refs are filed under the first page.
const SEED_PAGE: u32 = 1;

/// Clean-stop flag shared between the crawler and signal handlers
///
/// Triggering lets the in-flight detail visits finish and persist before
/// the run winds down; no listing is left half-claimed.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// How a single detail visit ended
#[derive(Debug)]
enum VisitOutcome {
    /// Payload captured and the listing marked visited
    Captured,
    /// Detail page held no payload; listing left pending
    EmptyPayload,
    /// Navigation kept failing; listing left pending
    Unreachable,
}

/// What a listing-page fetch produced
enum ListingView {
    /// A served results page
    View(FetchedPage),
    /// HTTP 404: the catalog has no such page
    End,
}

/// How one results page ended
enum PageOutcome {
    /// Every listing on the page is visited
    Completed,
    /// The catalog ended at this page
    Exhausted,
    /// Clean stop requested mid-page
    Stopped,
}

/// A failed navigation, classified for the retrier
#[derive(Debug, Error)]
enum VisitError {
    #[error("{0}")]
    Network(#[from] FetchError),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("blank page served")]
    Blank,
}

/// Sorts a fetch result into retry/fatal/success
///
/// Transport failures (timeout, connection, HTTP 429) and server errors
/// are worth another attempt, as is a blank body (an aborted navigation).
/// Remaining client errors are permanent for this visit.
fn classify_fetch(result: Result<FetchedPage, FetchError>) -> Attempt<FetchedPage, VisitError> {
    match result {
        Err(error) => Attempt::Retry(VisitError::Network(error)),
        Ok(page) if page.status >= 500 => Attempt::Retry(VisitError::Http(page.status)),
        Ok(page) if page.status >= 400 => Attempt::Fatal(VisitError::Http(page.status)),
        Ok(page) if page.is_blank() => Attempt::Retry(VisitError::Blank),
        Ok(page) => Attempt::Ok(page),
    }
}

fn page_base(view: &FetchedPage) -> Result<Url, PiseroError> {
    Url::parse(&view.final_url).map_err(|e| {
        PiseroError::Config(ConfigError::InvalidUrl(format!(
            "{}: {}",
            view.final_url, e
        )))
    })
}

/// Main crawler structure
pub struct Crawler {
    config: Arc<Config>,
    store: Arc<Mutex<SqliteStore>>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
    run_id: i64,
    summary: CrawlSummary,
}

impl Crawler {
    /// Creates a new crawler instance
    ///
    /// Opens the store, closes out any run row a crash left open, clears
    /// crawl state when `fresh` is set, and registers a new run.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the loaded configuration, stored with the run
    /// * `fresh` - Whether to discard persisted page records first
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Successfully initialized
    /// * `Err(PiseroError)` - Failed to initialize
    pub fn new(config: Config, config_hash: &str, fresh: bool) -> Result<Self, PiseroError> {
        let store_path = Path::new(&config.output.database_path);
        let mut store = SqliteStore::new(store_path)?;

        let stale = store.interrupt_stale_runs()?;
        if stale > 0 {
            tracing::info!("Marked {} crashed run(s) as interrupted", stale);
        }

        if fresh {
            store.clear_crawl_state()?;
            tracing::info!("Cleared page records, starting fresh");
        }

        let run_id = store.create_run(config_hash)?;

        let pacing = Arc::new(HumanPacing::from_config(&config.crawler));
        let fetcher = HttpFetcher::new(&config.crawler, pacing)?;
        let extractor = Extractor::from_config(&config.site)?;
        let retry = RetryPolicy::from_config(&config.crawler);

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            retry,
            shutdown: ShutdownSignal::new(),
            run_id,
            summary: CrawlSummary::default(),
        })
    }

    /// Returns a handle that signal handlers can trigger to stop the run
    /// after the in-flight work persists
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Runs the crawl from the resume point to the end of the catalog
    ///
    /// The resume point is the first page with no records or with pending
    /// listings; completed pages are never rescanned. The run ends when a
    /// freshly navigated page serves no listings (or a 404), which is the
    /// catalog telling us we walked off its end.
    pub async fn run(&mut self) -> Result<CrawlSummary, PiseroError> {
        let start_page = {
            let store = self.store.lock().unwrap();
            store.locate_resume_page()?
        };
        if start_page > 1 {
            tracing::info!("Run {}: resuming at page {}", self.run_id, start_page);
        } else {
            tracing::info!("Run {}: starting at page 1", self.run_id);
        }

        let started = std::time::Instant::now();
        let mut page = start_page;

        let status = loop {
            if self.shutdown.is_triggered() {
                tracing::info!("Stop requested, ending run before page {}", page);
                break RunStatus::Interrupted;
            }

            match self.process_page(page).await? {
                PageOutcome::Completed => {
                    self.summary.pages_completed += 1;
                    page += 1;
                }
                PageOutcome::Exhausted => break RunStatus::Completed,
                PageOutcome::Stopped => break RunStatus::Interrupted,
            }
        };

        self.finish(status)?;
        tracing::info!(
            "Run {} {} in {:?}: {}",
            self.run_id,
            status,
            started.elapsed(),
            self.summary
        );
        Ok(self.summary)
    }

    /// Drains a fixed set of listings supplied from a seed file
    ///
    /// One pass: the seeds are merged under page 1 (seeds whose id already
    /// lives on another page go to the duplicate ledger instead) and every
    /// still-pending seed is visited once. Listings that stay pending are
    /// left for a later run; there is no sweep loop here.
    pub async fn run_seed(&mut self, seeds: Vec<DiscoveredRef>) -> Result<CrawlSummary, PiseroError> {
        tracing::info!("Run {}: seed drain of {} listing(s)", self.run_id, seeds.len());

        self.merge_and_ledger(SEED_PAGE, &seeds)?;

        let mut seen = HashSet::new();
        let mut actionable = Vec::new();
        {
            let store = self.store.lock().unwrap();
            for seed in &seeds {
                if !seen.insert(seed.id.as_str()) {
                    continue;
                }
                if let Some(stored) = store.get_ref(&seed.id)? {
                    if !stored.visited {
                        actionable.push(stored);
                    }
                }
            }
        }

        tracing::info!(
            "Run {}: {} seed listing(s) pending after merge",
            self.run_id,
            actionable.len()
        );

        let stopped = self.visit_batches(&actionable).await?;
        let status = if stopped {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };

        self.finish(status)?;
        tracing::info!("Run {} {}: {}", self.run_id, status, self.summary);
        Ok(self.summary)
    }

    /// Processes one results page from discovery to completion
    ///
    /// Discovery failures re-enter after a pause instead of aborting: the
    /// page cannot be skipped without breaking the resume guarantee, so
    /// the loop keeps trying and keeps logging until an operator steps in.
    async fn process_page(&mut self, page: u32) -> Result<PageOutcome, PiseroError> {
        let page_url = self.config.site.page_url(page);
        let mut progress = PageProgress::new(page);
        progress.advance(PagePhase::Discovering);

        let first_view = loop {
            if self.shutdown.is_triggered() {
                return Ok(PageOutcome::Stopped);
            }
            match self.fetch_listing_view(&page_url).await {
                Ok(ListingView::View(view)) => break view,
                Ok(ListingView::End) => {
                    tracing::info!("Page {} is gone (404), catalog exhausted", page);
                    return Ok(PageOutcome::Exhausted);
                }
                Err(error) => {
                    self.summary.errors += 1;
                    let pause = self.retry.delay_for(self.retry.max_attempts);
                    tracing::warn!(
                        "Page {} unreachable: {} (retrying discovery in {:?})",
                        page,
                        error,
                        pause
                    );
                    tokio::time::sleep(pause).await;
                }
            }
        };

        let base = page_base(&first_view)?;
        let discovered = self.extractor.listing_refs(&first_view.body, &base);
        if discovered.is_empty() {
            tracing::info!("Page {} has no listings, catalog exhausted", page);
            return Ok(PageOutcome::Exhausted);
        }

        tracing::info!("Page {}: {} listing(s) in view", page, discovered.len());
        self.merge_and_ledger(page, &discovered)?;
        progress.advance(PagePhase::Draining);

        // The discovery view serves the first sweep; every later sweep
        // re-navigates, because pending can only shrink if visited
        // listings are re-discoverable in a current view.
        let mut current_view = Some(discovered);

        loop {
            let pending = {
                let store = self.store.lock().unwrap();
                store.pending_ids(page)?
            };
            if pending.is_empty() {
                progress.advance(PagePhase::Complete);
                tracing::info!("Page {} complete after {} sweep(s)", page, progress.sweeps());
                return Ok(PageOutcome::Completed);
            }

            if self.shutdown.is_triggered() {
                return Ok(PageOutcome::Stopped);
            }

            let sweep = progress.record_sweep();
            tracing::info!(
                "Page {}: sweep {}, {} listing(s) pending",
                page,
                sweep,
                pending.len()
            );

            let in_view = match current_view.take() {
                Some(refs) => refs,
                None => match self.renavigate(page, &page_url, pending.len()).await? {
                    Some(refs) => refs,
                    None => return Ok(PageOutcome::Stopped),
                },
            };

            let in_view_ids: HashSet<&str> = in_view.iter().map(|r| r.id.as_str()).collect();
            let actionable: Vec<ListingRef> = {
                let store = self.store.lock().unwrap();
                store
                    .pending_refs(page)?
                    .into_iter()
                    .filter(|r| in_view_ids.contains(r.id.as_str()))
                    .collect()
            };

            if actionable.is_empty() {
                tracing::warn!(
                    "Page {}: nothing actionable for {} pending listing(s), re-navigating",
                    page,
                    pending.len()
                );
                tokio::time::sleep(self.retry.delay_for(1)).await;
                continue;
            }

            if self.visit_batches(&actionable).await? {
                return Ok(PageOutcome::Stopped);
            }
        }
    }

    /// Re-fetches a page mid-drain until it serves listings again
    ///
    /// Merges whatever the fresh view holds, so listings that drifted onto
    /// the page during the drain are picked up. Returns None only when a
    /// clean stop interrupts the wait; exhaustion is not accepted here
    /// because the page still has pending listings.
    async fn renavigate(
        &mut self,
        page: u32,
        page_url: &str,
        pending: usize,
    ) -> Result<Option<Vec<DiscoveredRef>>, PiseroError> {
        loop {
            if self.shutdown.is_triggered() {
                return Ok(None);
            }
            match self.fetch_listing_view(page_url).await {
                Ok(ListingView::View(view)) => {
                    let base = page_base(&view)?;
                    let refs = self.extractor.listing_refs(&view.body, &base);
                    if refs.is_empty() {
                        tracing::warn!(
                            "Page {}: view came back empty with {} pending, re-navigating",
                            page,
                            pending
                        );
                        tokio::time::sleep(self.retry.delay_for(1)).await;
                        continue;
                    }
                    self.merge_and_ledger(page, &refs)?;
                    return Ok(Some(refs));
                }
                Ok(ListingView::End) => {
                    tracing::warn!(
                        "Page {} now returns 404 with {} pending, re-navigating",
                        page,
                        pending
                    );
                    tokio::time::sleep(self.retry.delay_for(self.retry.max_attempts)).await;
                }
                Err(error) => {
                    self.summary.errors += 1;
                    let pause = self.retry.delay_for(self.retry.max_attempts);
                    tracing::warn!(
                        "Page {} unreachable mid-drain: {} (retrying in {:?})",
                        page,
                        error,
                        pause
                    );
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    /// One bounded-retry cycle against a results page URL
    async fn fetch_listing_view(
        &self,
        url: &str,
    ) -> Result<ListingView, RetryError<VisitError>> {
        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_string();

        retry_with_backoff(&self.retry, move |_| {
            let fetcher = Arc::clone(&fetcher);
            let url = url.clone();
            async move {
                let result = fetcher.fetch(&url).await;
                if let Ok(page) = &result {
                    if page.status == 404 {
                        return Attempt::Ok(ListingView::End);
                    }
                }
                match classify_fetch(result) {
                    Attempt::Ok(page) => Attempt::Ok(ListingView::View(page)),
                    Attempt::Retry(error) => Attempt::Retry(error),
                    Attempt::Fatal(error) => Attempt::Fatal(error),
                }
            }
        })
        .await
    }

    /// Merges a discovery batch and routes cross-page collisions to the
    /// duplicate ledger
    fn merge_and_ledger(&mut self, page: u32, refs: &[DiscoveredRef]) -> Result<(), PiseroError> {
        let outcome = {
            let mut store = self.store.lock().unwrap();
            store.merge_page(page, refs)?
        };

        if outcome.inserted > 0 {
            tracing::info!("Page {}: {} new listing(s) recorded", page, outcome.inserted);
        }

        for duplicate in &outcome.cross_page {
            let count = {
                let mut store = self.store.lock().unwrap();
                store.record_duplicate(&duplicate.id, &duplicate.url)?
            };
            self.summary.duplicates_detected += 1;
            tracing::debug!(
                "Listing {} re-observed on page {} ({} sighting(s) beyond the first)",
                duplicate.id,
                page,
                count
            );
        }

        Ok(())
    }

    /// Visits listings in batches of `detail-workers`; returns true when a
    /// clean stop interrupted dispatch (finished batches are persisted)
    async fn visit_batches(&mut self, listings: &[ListingRef]) -> Result<bool, PiseroError> {
        let workers = self.config.crawler.detail_workers.max(1) as usize;

        for batch in listings.chunks(workers) {
            if self.shutdown.is_triggered() {
                return Ok(true);
            }

            let mut handles = Vec::with_capacity(batch.len());
            for listing in batch {
                handles.push(tokio::spawn(visit_listing(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.extractor),
                    Arc::clone(&self.store),
                    self.retry.clone(),
                    listing.clone(),
                )));
            }

            for handle in handles {
                match handle.await {
                    Ok(outcome) => self.apply_visit_outcome(outcome?),
                    Err(join_error) => {
                        tracing::error!("Detail visit task failed: {}", join_error);
                        self.summary.errors += 1;
                    }
                }
            }
        }

        Ok(false)
    }

    fn apply_visit_outcome(&mut self, outcome: VisitOutcome) {
        match outcome {
            VisitOutcome::Captured => self.summary.listings_visited += 1,
            VisitOutcome::EmptyPayload | VisitOutcome::Unreachable => self.summary.errors += 1,
        }
    }

    fn finish(&mut self, status: RunStatus) -> Result<(), PiseroError> {
        let mut store = self.store.lock().unwrap();
        store.finish_run(self.run_id, status, &self.summary)?;
        Ok(())
    }
}

/// Visits one listing's detail page and records the outcome
///
/// Navigation runs under the retry policy; a blank page counts as an
/// aborted navigation and is retried like a timeout. Only a non-empty
/// extracted payload marks the listing visited: "visited" means captured,
/// not merely navigated to. Everything short of that leaves the listing
/// pending with its failure noted.
async fn visit_listing(
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    store: Arc<Mutex<SqliteStore>>,
    retry: RetryPolicy,
    listing: ListingRef,
) -> Result<VisitOutcome, StoreError> {
    tracing::debug!("Visiting listing {} at {}", listing.id, listing.url);

    let fetched = {
        let fetcher = Arc::clone(&fetcher);
        let url = listing.url.clone();
        retry_with_backoff(&retry, move |_| {
            let fetcher = Arc::clone(&fetcher);
            let url = url.clone();
            async move { classify_fetch(fetcher.fetch(&url).await) }
        })
        .await
    };

    let page_view = match fetched {
        Ok(view) => view,
        Err(error) => {
            let reason = error.to_string();
            tracing::warn!("Listing {} unreachable: {}", listing.id, reason);
            let mut store = store.lock().unwrap();
            store.record_visit_failure(&listing.id, &reason)?;
            return Ok(VisitOutcome::Unreachable);
        }
    };

    let payload = match extractor.detail_payload(&page_view.body) {
        Some(payload) => payload,
        None => {
            tracing::warn!(
                "Listing {}: detail page held no payload, left pending",
                listing.id
            );
            let mut store = store.lock().unwrap();
            store.record_visit_failure(&listing.id, "empty detail payload")?;
            return Ok(VisitOutcome::EmptyPayload);
        }
    };

    let detail = ListingDetail {
        id: listing.id.clone(),
        payload,
        captured_at: Utc::now().to_rfc3339(),
    };

    let mut store = store.lock().unwrap();
    let fresh = store.insert_detail(&detail)?;
    if !fresh {
        tracing::debug!("Listing {} already had a stored detail", listing.id);
    }
    store.mark_visited(listing.page_number, &listing.id)?;

    tracing::info!("Captured listing {}", listing.id);
    Ok(VisitOutcome::Captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use async_trait::async_trait;
    use std::time::Duration;

    const DETAIL_HTML: &str = r#"
        <html><body>
            <div class="detail"><h1>Piso en Chamberí</h1><p>3 habitaciones, 95 m².</p></div>
        </body></html>
    "#;

    /// Always serves the same reply: a 200 with the given body, or a
    /// timeout when no body is set.
    struct FixedFetcher {
        body: Option<String>,
    }

    #[async_trait]
    impl PageFetcher for FixedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            match &self.body {
                Some(body) => Ok(FetchedPage {
                    status: 200,
                    body: body.clone(),
                    final_url: url.to_string(),
                }),
                None => Err(FetchError::Timeout),
            }
        }
    }

    fn test_extractor() -> Arc<Extractor> {
        Arc::new(
            Extractor::from_config(&SiteConfig {
                base_url: "https://example.com/alquiler/madrid/".to_string(),
                page_url_template: "{base}pagina-{page}.htm".to_string(),
                listing_selector: "main article".to_string(),
                link_selector: "a.item-link".to_string(),
                detail_selector: "div.detail".to_string(),
            })
            .unwrap(),
        )
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            jitter_max: Duration::ZERO,
        }
    }

    fn seeded_store(id: &str, url: &str) -> Arc<Mutex<SqliteStore>> {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .merge_page(1, &[DiscoveredRef::new(id, url, "Piso")])
            .unwrap();
        Arc::new(Mutex::new(store))
    }

    #[test]
    fn test_shutdown_signal_latches() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());

        let handle = signal.clone();
        handle.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_classify_transport_errors_retryable() {
        assert!(matches!(
            classify_fetch(Err(FetchError::Timeout)),
            Attempt::Retry(VisitError::Network(_))
        ));
        assert!(matches!(
            classify_fetch(Err(FetchError::RateLimited)),
            Attempt::Retry(VisitError::Network(_))
        ));
        assert!(matches!(
            classify_fetch(Err(FetchError::ConnectionFailed("refused".into()))),
            Attempt::Retry(VisitError::Network(_))
        ));
    }

    #[test]
    fn test_classify_status_codes() {
        let page = |status: u16| FetchedPage {
            status,
            body: "<html>x</html>".to_string(),
            final_url: "https://example.com/x".to_string(),
        };

        assert!(matches!(
            classify_fetch(Ok(page(503))),
            Attempt::Retry(VisitError::Http(503))
        ));
        assert!(matches!(
            classify_fetch(Ok(page(403))),
            Attempt::Fatal(VisitError::Http(403))
        ));
        assert!(matches!(
            classify_fetch(Ok(page(404))),
            Attempt::Fatal(VisitError::Http(404))
        ));
        assert!(matches!(classify_fetch(Ok(page(200))), Attempt::Ok(_)));
    }

    #[test]
    fn test_classify_blank_page_retryable() {
        let blank = FetchedPage {
            status: 200,
            body: "   ".to_string(),
            final_url: "https://example.com/x".to_string(),
        };
        assert!(matches!(
            classify_fetch(Ok(blank)),
            Attempt::Retry(VisitError::Blank)
        ));
    }

    #[tokio::test]
    async fn test_visit_captures_and_marks_visited() {
        let url = "https://example.com/inmueble/93001234/";
        let store = seeded_store("inmueble/93001234", url);
        let listing = store
            .lock()
            .unwrap()
            .get_ref("inmueble/93001234")
            .unwrap()
            .unwrap();

        let fetcher: Arc<dyn PageFetcher> = Arc::new(FixedFetcher {
            body: Some(DETAIL_HTML.to_string()),
        });

        let outcome = visit_listing(
            fetcher,
            test_extractor(),
            Arc::clone(&store),
            fast_retry(),
            listing,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, VisitOutcome::Captured));

        let store = store.lock().unwrap();
        let stored = store.get_ref("inmueble/93001234").unwrap().unwrap();
        assert!(stored.visited);
        let detail = store.get_detail("inmueble/93001234").unwrap().unwrap();
        assert!(detail.payload.contains("3 habitaciones"));
    }

    #[tokio::test]
    async fn test_visit_empty_payload_leaves_pending() {
        let url = "https://example.com/inmueble/93001234/";
        let store = seeded_store("inmueble/93001234", url);
        let listing = store
            .lock()
            .unwrap()
            .get_ref("inmueble/93001234")
            .unwrap()
            .unwrap();

        // A served page whose detail box is missing entirely.
        let fetcher: Arc<dyn PageFetcher> = Arc::new(FixedFetcher {
            body: Some("<html><body><p>consent wall</p></body></html>".to_string()),
        });

        let outcome = visit_listing(
            fetcher,
            test_extractor(),
            Arc::clone(&store),
            fast_retry(),
            listing,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, VisitOutcome::EmptyPayload));

        let store = store.lock().unwrap();
        let stored = store.get_ref("inmueble/93001234").unwrap().unwrap();
        assert!(!stored.visited);
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.last_error.as_deref(), Some("empty detail payload"));
        assert!(store.get_detail("inmueble/93001234").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_visit_unreachable_leaves_pending() {
        let url = "https://example.com/inmueble/93001234/";
        let store = seeded_store("inmueble/93001234", url);
        let listing = store
            .lock()
            .unwrap()
            .get_ref("inmueble/93001234")
            .unwrap()
            .unwrap();

        let fetcher: Arc<dyn PageFetcher> = Arc::new(FixedFetcher { body: None });

        let outcome = visit_listing(
            fetcher,
            test_extractor(),
            Arc::clone(&store),
            fast_retry(),
            listing,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, VisitOutcome::Unreachable));

        let store = store.lock().unwrap();
        let stored = store.get_ref("inmueble/93001234").unwrap().unwrap();
        assert!(!stored.visited);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.last_error.is_some());
    }
}
