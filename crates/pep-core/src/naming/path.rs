//! Extension extraction from a page URL.

/// Extension used when the URL's last path segment has none.
const FALLBACK_EXTENSION: &str = "jpg";

/// Returns the extension of the URL's last path segment, without the dot.
///
/// Query string and fragment are ignored. Falls back to `jpg` when the URL
/// cannot be parsed or the segment carries no usable extension.
pub fn extension_from_url(url: &str) -> String {
    let segment = url::Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });
    segment
        .as_deref()
        .and_then(|s| s.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
