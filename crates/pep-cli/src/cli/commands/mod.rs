//! CLI command handlers. Each command is in its own file.

mod download;
mod panel;
mod settings;

pub use download::run_download;
pub use panel::run_panel;
pub use settings::run_settings;

#[cfg(test)]
pub(crate) use panel::{parse_action, saved_template, PanelAction};
#[cfg(test)]
pub(crate) use settings::{format_warnings, save_naming_format};

use anyhow::Result;
use pep_core::api::http::RequestOptions;
use pep_core::api::PixivApi;
use pep_core::config::PepConfig;
use pep_core::downloader::CurlDownloader;
use pep_core::notify::Notifier;
use pep_core::orchestrator::{Orchestrator, OrchestratorOptions};
use pep_core::settings::SettingsStore;
use std::path::Path;
use std::sync::Arc;

/// Wires the libcurl client and downloader into an orchestrator.
/// `download_dir` overrides the configured directory; the fallback is the current directory.
fn build_orchestrator(
    cfg: &PepConfig,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    download_dir: Option<&Path>,
) -> Result<Orchestrator<PixivApi, CurlDownloader>> {
    let downloader = match download_dir {
        Some(dir) => CurlDownloader::new(dir, RequestOptions::for_download(cfg)),
        None => CurlDownloader::from_config(cfg, &std::env::current_dir()?),
    };
    tracing::debug!(dir = %downloader.dir().display(), "download directory");
    Ok(Orchestrator::new(
        PixivApi::from_config(cfg),
        Arc::new(downloader),
        notifier,
        settings,
        OrchestratorOptions::from_config(cfg),
    ))
}
