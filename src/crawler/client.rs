//! HTTP fetching for listing and detail pages
//!
//! All navigations go through the [`PageFetcher`] trait so the crawl loop
//! can be exercised against scripted fetchers in tests. The production
//! implementation wraps a reqwest client and paces itself before every
//! request.

use crate::config::CrawlerConfig;
use crate::crawler::pacing::DelayStrategy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A fetched page, after redirects
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Final URL after redirects
    pub final_url: String,
}

impl FetchedPage {
    /// True when the server answered but sent nothing worth parsing
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Transport-level failures, classified for retry decisions
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("request failed: {0}")]
    Other(String),
}

/// Fetches one page by URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Production fetcher: reqwest client plus a pacing strategy applied
/// before every request
pub struct HttpFetcher {
    client: Client,
    pacing: Arc<dyn DelayStrategy>,
}

impl HttpFetcher {
    pub fn new(
        config: &CrawlerConfig,
        pacing: Arc<dyn DelayStrategy>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            pacing,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let pause = self.pacing.pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
            final_url,
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::ConnectionFailed(error.to_string())
    } else {
        FetchError::Other(error.to_string())
    }
}

/// Builds the HTTP client from crawler configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
