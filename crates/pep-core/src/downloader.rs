//! Download primitive: fetch one URL into a named file.
//!
//! `CurlDownloader` streams the body into `<dir>/<name>.part` and renames it to
//! `<dir>/<name>` once the transfer succeeds. An existing file is overwritten.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::http::{self, HttpError, RequestOptions};
use crate::config::PepConfig;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("download task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Saves `url` under `name`. Returns the number of bytes written.
pub trait FileDownloader: Send + Sync + 'static {
    fn download(&self, url: &str, name: &str) -> impl Future<Output = Result<u64, DownloadError>> + Send;
}

#[derive(Debug, Clone)]
pub struct CurlDownloader {
    dir: PathBuf,
    request: RequestOptions,
}

impl CurlDownloader {
    pub fn new(dir: impl Into<PathBuf>, request: RequestOptions) -> Self {
        Self {
            dir: dir.into(),
            request,
        }
    }

    /// Saves into `cfg.download_dir`, or `fallback_dir` when unset.
    pub fn from_config(cfg: &PepConfig, fallback_dir: &Path) -> Self {
        let dir = cfg
            .download_dir
            .clone()
            .unwrap_or_else(|| fallback_dir.to_path_buf());
        Self::new(dir, RequestOptions::for_download(cfg))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileDownloader for CurlDownloader {
    async fn download(&self, url: &str, name: &str) -> Result<u64, DownloadError> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(DownloadError::InvalidName(name.to_string()));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let final_path = self.dir.join(name);
        let part_path = self.dir.join(format!("{}.part", name));
        let url = url.to_string();
        let opts = self.request.clone();
        tokio::task::spawn_blocking(move || fetch_to_path(&url, &opts, &part_path, &final_path))
            .await?
    }
}

fn fetch_to_path(
    url: &str,
    opts: &RequestOptions,
    part_path: &Path,
    final_path: &Path,
) -> Result<u64, DownloadError> {
    let result = write_part(url, opts, part_path);
    match result {
        Ok(written) => {
            std::fs::rename(part_path, final_path)?;
            Ok(written)
        }
        Err(e) => {
            let _ = std::fs::remove_file(part_path);
            Err(e)
        }
    }
}

fn write_part(url: &str, opts: &RequestOptions, part_path: &Path) -> Result<u64, DownloadError> {
    let mut file = File::create(part_path)?;
    let mut written = 0u64;
    let mut write_err: Option<std::io::Error> = None;

    let transfer = http::get_with(url, opts, |data| match file.write_all(data) {
        Ok(()) => {
            written += data.len() as u64;
            true
        }
        Err(e) => {
            tracing::warn!("page download write failed: {}", e);
            write_err = Some(e);
            false
        }
    });

    if let Some(e) = write_err {
        return Err(DownloadError::Storage(e));
    }
    transfer?;
    file.flush()?;
    Ok(written)
}
