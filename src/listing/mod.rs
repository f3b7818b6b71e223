//! Listing identity and discovery types
//!
//! A listing is identified by a stable id derived from its canonical URL,
//! so the same advertisement maps to the same id across re-crawls no matter
//! which results page it surfaces on.

mod id;
mod seed;

pub use id::{listing_id_from_str, listing_id_from_url};
pub use seed::load_seed_refs;

/// A listing reference as produced by results-page extraction or a seed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRef {
    /// Stable id derived from the listing URL
    pub id: String,

    /// Absolute URL of the listing's detail page
    pub url: String,

    /// Anchor text captured at discovery time (may go stale)
    pub anchor_text: String,
}

impl DiscoveredRef {
    pub fn new(id: impl Into<String>, url: impl Into<String>, anchor_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            anchor_text: anchor_text.into(),
        }
    }
}
