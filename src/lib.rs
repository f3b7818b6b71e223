//! Pisero: a resumable crawler for paginated real-estate listings
//!
//! This crate walks a paginated listing site page by page, records every
//! discovered listing exactly once, visits each listing's detail page, and
//! survives interruption: a restarted run resumes at the first page that
//! still has unvisited listings.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod output;
pub mod store;

use thiserror::Error;

/// Main error type for pisero operations
#[derive(Debug, Error)]
pub enum PiseroError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Seed file error in {path}: {message}")]
    Seed { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {field}: {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// Result type alias for pisero operations
pub type Result<T> = std::result::Result<T, PiseroError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, ShutdownSignal};
pub use listing::{listing_id_from_url, DiscoveredRef};
pub use store::{CrawlSummary, ListingDetail, ListingRef, SqliteStore, Store};
