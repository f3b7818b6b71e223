//! HTML extraction for results pages and detail pages
//!
//! Two shapes of markup matter here:
//! - a results page holds a grid of listing articles, each wrapping an
//!   anchor to the listing's own page
//! - a detail page holds one content box whose text is the payload
//!
//! The selectors for both come from site configuration; this module only
//! knows how to apply them.

use crate::config::SiteConfig;
use crate::listing::{listing_id_from_url, DiscoveredRef};
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Compiled selectors for the configured site
pub struct Extractor {
    listing: Selector,
    link: Selector,
    detail: Selector,
}

impl Extractor {
    /// Compiles the site's selectors
    ///
    /// # Arguments
    ///
    /// * `site` - The site configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - All selectors compiled
    /// * `Err(ConfigError)` - A selector failed to parse
    pub fn from_config(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            listing: compile_selector("listing-selector", &site.listing_selector)?,
            link: compile_selector("link-selector", &site.link_selector)?,
            detail: compile_selector("detail-selector", &site.detail_selector)?,
        })
    }

    /// Extracts the listing refs currently in view on a results page
    ///
    /// Each listing article is searched for its anchor; the href is resolved
    /// against `base_url` and the listing id derived from the resolved URL.
    /// Articles without a usable anchor or a derivable id are skipped.
    pub fn listing_refs(&self, html: &str, base_url: &Url) -> Vec<DiscoveredRef> {
        let document = Html::parse_document(html);
        let mut refs = Vec::new();

        for article in document.select(&self.listing) {
            let anchor = match article.select(&self.link).next() {
                Some(a) => a,
                None => {
                    tracing::debug!("Listing article without an anchor, skipped");
                    continue;
                }
            };

            let href = match anchor.value().attr("href") {
                Some(h) => h.trim(),
                None => continue,
            };
            if href.is_empty() {
                continue;
            }

            let resolved = match base_url.join(href) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Unresolvable href {}: {}", href, e);
                    continue;
                }
            };

            let id = match listing_id_from_url(&resolved) {
                Some(id) => id,
                None => {
                    tracing::debug!("No listing id derivable from {}", resolved);
                    continue;
                }
            };

            let text = anchor.text().collect::<String>().trim().to_string();
            refs.push(DiscoveredRef::new(id, resolved.to_string(), text));
        }

        refs
    }

    /// Extracts the detail payload from a listing's own page
    ///
    /// Whitespace is collapsed to single spaces. Returns None when the
    /// detail box is missing or holds no text, so the caller can treat the
    /// page as not yet captured.
    pub fn detail_payload(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let element = document.select(&self.detail).next()?;

        let raw = element.text().collect::<String>();
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn compile_selector(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}
