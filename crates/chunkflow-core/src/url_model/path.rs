use url::Url;

/// Last non-empty segment of the URL path, taken verbatim (no percent-decoding).
///
/// `None` for unparsable URLs, URLs without a hierarchical path, and paths
/// ending in `/`.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|last| !last.is_empty())
        .map(str::to_owned)
}
