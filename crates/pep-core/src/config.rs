use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/pep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PepConfig {
    /// Base URL of the site serving the `/ajax/illust` endpoints.
    pub api_base: String,
    /// Host that replaces `i.pximg.net` in page URLs. None keeps the original CDN host.
    #[serde(default)]
    pub mirror_host: Option<String>,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Optional raw `Cookie` header (e.g. `PHPSESSID=...`) for restricted works.
    #[serde(default)]
    pub cookie: Option<String>,
    /// Where files are saved. None = current working directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Delay between starting two page downloads, in milliseconds.
    pub pacing_ms: u64,
    /// Page count from which per-file success toasts are suppressed.
    pub quiet_threshold: usize,
    /// Display time stamped on every toast, in milliseconds. Notifiers that
    /// can expire banners honor it; the terminal notifier prints lines that
    /// stay in scrollback and ignores it.
    pub toast_duration_ms: u64,
}

impl Default for PepConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.pixiv.net".to_string(),
            mirror_host: Some("i.pixiv.re".to_string()),
            user_agent: concat!("pep/", env!("CARGO_PKG_VERSION")).to_string(),
            cookie: None,
            download_dir: None,
            pacing_ms: 200,
            quiet_threshold: 5,
            toast_duration_ms: 3000,
        }
    }
}

impl PepConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PepConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
