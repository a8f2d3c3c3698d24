//! Blocking libcurl GET shared by the ajax client and the file downloader.
//!
//! Runs in the current thread; call from `spawn_blocking` when used from async code.

use crate::config::PepConfig;
use std::time::Duration;

/// Referer pixiv expects on ajax calls and on original-image requests.
pub const PIXIV_REFERER: &str = "https://www.pixiv.net/";

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
}

/// Headers and timeouts applied to every request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub user_agent: String,
    pub referer: Option<String>,
    pub cookie: Option<String>,
    pub connect_timeout: Duration,
    /// Total transfer timeout.
    pub timeout: Duration,
}

impl RequestOptions {
    /// Options for the small JSON endpoints.
    pub fn for_api(cfg: &PepConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            referer: Some(PIXIV_REFERER.to_string()),
            cookie: cfg.cookie.clone(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
        }
    }

    /// Options for image downloads (long total timeout).
    pub fn for_download(cfg: &PepConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(3600),
            ..Self::for_api(cfg)
        }
    }
}

/// Performs a GET and feeds the body to `sink`. `sink` returns false to abort.
/// Follows redirects; non-2xx final status is an error.
pub fn get_with<F>(url: &str, opts: &RequestOptions, mut sink: F) -> Result<(), HttpError>
where
    F: FnMut(&[u8]) -> bool,
{
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.useragent(&opts.user_agent)?;
    if let Some(referer) = &opts.referer {
        easy.referer(referer)?;
    }
    if let Some(cookie) = &opts.cookie {
        easy.cookie(cookie)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            if sink(data) {
                Ok(data.len())
            } else {
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(HttpError::Status(code));
    }
    Ok(())
}

/// Performs a GET and returns the whole body.
pub fn get_bytes(url: &str, opts: &RequestOptions) -> Result<Vec<u8>, HttpError> {
    let mut body = Vec::new();
    get_with(url, opts, |data| {
        body.extend_from_slice(data);
        true
    })?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_options_carry_referer_and_cookie() {
        let cfg = PepConfig {
            cookie: Some("PHPSESSID=abc".to_string()),
            ..PepConfig::default()
        };
        let opts = RequestOptions::for_api(&cfg);
        assert_eq!(opts.referer.as_deref(), Some(PIXIV_REFERER));
        assert_eq!(opts.cookie.as_deref(), Some("PHPSESSID=abc"));
        assert_eq!(opts.user_agent, cfg.user_agent);
    }

    #[test]
    fn download_options_have_longer_timeout() {
        let cfg = PepConfig::default();
        let api = RequestOptions::for_api(&cfg);
        let dl = RequestOptions::for_download(&cfg);
        assert!(dl.timeout > api.timeout);
        assert_eq!(dl.referer, api.referer);
    }

    #[test]
    fn status_error_display() {
        assert_eq!(HttpError::Status(404).to_string(), "HTTP 404");
    }
}
