//! Crawler module - the crawl state machine and its collaborators
//!
//! This module contains the moving parts of a crawl:
//! - HTTP fetching behind a trait, with pacing between navigations
//! - Bounded exponential-backoff retry for transient failures
//! - Selector-driven extraction of listing refs and detail payloads
//! - Per-page phase tracking
//! - The orchestrator that walks the catalog page by page

mod client;
mod extract;
mod frontier;
mod orchestrator;
mod pacing;
mod retry;

pub use client::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use extract::Extractor;
pub use frontier::{PagePhase, PageProgress};
pub use orchestrator::{Crawler, ShutdownSignal};
pub use pacing::{DelayStrategy, HumanPacing, NoPacing};
pub use retry::{retry_with_backoff, Attempt, RetryError, RetryPolicy};
