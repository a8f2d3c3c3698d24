//! Network client for pixiv's ajax endpoints.
//!
//! Two read-only calls: the page list of a work and its details. The fallible
//! `fetch_*` methods report why a call failed; the `IllustSource` impl logs the
//! failure and degrades to an empty list or `None`. Nothing is retried.

pub mod http;

mod envelope;
mod illust;
mod pages;

pub use illust::IllustMetadata;
pub use pages::{rewrite_image_host, PRIMARY_IMAGE_HOST};

use std::future::Future;

use crate::config::PepConfig;
use crate::illust_id::IllustId;
use http::{HttpError, RequestOptions};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("response has no body")]
    MissingBody,
    #[error("request task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where the orchestrator gets page URLs and metadata from.
///
/// Both methods swallow their own failures: an unreachable endpoint yields
/// an empty list or `None`, never an error.
pub trait IllustSource: Send + Sync {
    /// Original-resolution URLs, ordered by page number.
    fn page_urls(&self, id: IllustId) -> impl Future<Output = Vec<String>> + Send;

    fn metadata(&self, id: IllustId) -> impl Future<Output = Option<IllustMetadata>> + Send;
}

/// libcurl-backed client for the pixiv ajax API.
#[derive(Debug, Clone)]
pub struct PixivApi {
    base: String,
    mirror_host: Option<String>,
    request: RequestOptions,
}

impl PixivApi {
    pub fn new(base: &str, mirror_host: Option<String>, request: RequestOptions) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            mirror_host,
            request,
        }
    }

    pub fn from_config(cfg: &PepConfig) -> Self {
        Self::new(
            &cfg.api_base,
            cfg.mirror_host.clone(),
            RequestOptions::for_api(cfg),
        )
    }

    pub fn pages_url(&self, id: IllustId) -> String {
        format!("{}/ajax/illust/{}/pages", self.base, id)
    }

    pub fn illust_url(&self, id: IllustId) -> String {
        format!("{}/ajax/illust/{}", self.base, id)
    }

    /// Page URLs of `id`, with the image host rewritten to the mirror if configured.
    pub async fn fetch_pages(&self, id: IllustId) -> Result<Vec<String>, ApiError> {
        let bytes = self.get(self.pages_url(id)).await?;
        pages::parse_pages(&bytes, self.mirror_host.as_deref())
    }

    pub async fn fetch_illust(&self, id: IllustId) -> Result<IllustMetadata, ApiError> {
        let bytes = self.get(self.illust_url(id)).await?;
        illust::parse_illust(&bytes)
    }

    async fn get(&self, url: String) -> Result<Vec<u8>, ApiError> {
        let opts = self.request.clone();
        tracing::debug!(%url, "GET");
        let bytes = tokio::task::spawn_blocking(move || http::get_bytes(&url, &opts)).await??;
        Ok(bytes)
    }
}

impl IllustSource for PixivApi {
    async fn page_urls(&self, id: IllustId) -> Vec<String> {
        match self.fetch_pages(id).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!(illust_id = %id, "failed to get page urls: {}", e);
                Vec::new()
            }
        }
    }

    async fn metadata(&self, id: IllustId) -> Option<IllustMetadata> {
        match self.fetch_illust(id).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::error!(illust_id = %id, "failed to get illust data: {}", e);
                None
            }
        }
    }
}
