use serde::Deserialize;

/// Main configuration structure for pisero
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Target site configuration: where the paginated listing lives and how to
/// cut listings out of its markup
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// URL of the first page of results
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Template for page 2 and beyond; `{base}` and `{page}` are substituted
    #[serde(rename = "page-url-template")]
    pub page_url_template: String,

    /// CSS selector matching one listing article on a results page
    #[serde(rename = "listing-selector")]
    pub listing_selector: String,

    /// CSS selector for the anchor inside a listing article
    #[serde(rename = "link-selector")]
    pub link_selector: String,

    /// CSS selector for the detail payload box on a listing's own page
    #[serde(rename = "detail-selector")]
    pub detail_selector: String,
}

impl SiteConfig {
    /// Builds the URL for a given page of results. Page 1 is the base URL
    /// itself; later pages go through the template.
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            self.base_url.clone()
        } else {
            self.page_url_template
                .replace("{base}", &self.base_url)
                .replace("{page}", &page.to_string())
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per navigation before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound of the random jitter added to each backoff wait (milliseconds)
    #[serde(rename = "backoff-jitter-ms")]
    pub backoff_jitter_ms: u64,

    /// Minimum pause before each navigation (milliseconds)
    #[serde(rename = "pause-min-ms")]
    pub pause_min_ms: u64,

    /// Maximum pause before each navigation (milliseconds)
    #[serde(rename = "pause-max-ms")]
    pub pause_max_ms: u64,

    /// Concurrent detail visits within one sweep
    #[serde(rename = "detail-workers")]
    pub detail_workers: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
