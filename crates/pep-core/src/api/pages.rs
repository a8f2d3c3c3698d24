//! `GET /ajax/illust/{id}/pages`: original-resolution URLs of every page.

use serde::Deserialize;

use super::envelope::decode_body;
use super::ApiError;

/// Primary CDN host serving original images.
pub const PRIMARY_IMAGE_HOST: &str = "i.pximg.net";

#[derive(Debug, Clone, Deserialize)]
struct Page {
    urls: Urls,
}

#[derive(Debug, Clone, Deserialize)]
struct Urls {
    original: String,
}

/// Parses a pages response into ordered original URLs, rewritten to `mirror_host` if given.
pub(crate) fn parse_pages(bytes: &[u8], mirror_host: Option<&str>) -> Result<Vec<String>, ApiError> {
    let pages: Vec<Page> = decode_body(bytes)?;
    Ok(pages
        .into_iter()
        .map(|page| match mirror_host {
            Some(mirror) => rewrite_image_host(&page.urls.original, mirror),
            None => page.urls.original,
        })
        .collect())
}

/// Swaps the `i.pximg.net` host for `mirror`. Other hosts are left alone.
pub fn rewrite_image_host(url: &str, mirror: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.host_str() == Some(PRIMARY_IMAGE_HOST) => {
            if parsed.set_host(Some(mirror)).is_ok() {
                parsed.to_string()
            } else {
                url.to_string()
            }
        }
        _ => url.to_string(),
    }
}
