use url::Url;

/// Derives the stable listing id from a listing URL: the last two non-empty
/// path segments joined with `/`.
///
/// Listing portals end detail URLs with a slug plus a numeric key
/// (`/alquiler/piso-calle-mayor/187654321/`); both segments together are
/// unique and survive re-crawls, while earlier segments (province, filters)
/// drift. Empty segments are ignored so a trailing slash does not split the
/// same listing into two ids.
///
/// Returns `None` when the URL has fewer than two non-empty segments.
pub fn listing_id_from_url(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    if segments.len() < 2 {
        return None;
    }

    Some(segments[segments.len() - 2..].join("/"))
}

/// Convenience wrapper over [`listing_id_from_url`] for string URLs
pub fn listing_id_from_str(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    listing_id_from_url(&parsed)
}
