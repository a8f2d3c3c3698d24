//! `pep download <target>` – download every page of one illustration.

use anyhow::Result;
use pep_core::config::PepConfig;
use pep_core::illust_id::IllustId;
use pep_core::notify::{Notifier, TerminalNotifier, Toast};
use pep_core::settings::FileSettings;
use std::path::Path;
use std::sync::Arc;

use super::build_orchestrator;

pub async fn run_download(
    cfg: &PepConfig,
    settings: Arc<FileSettings>,
    target: &str,
    download_dir: Option<&Path>,
) -> Result<()> {
    let notifier = Arc::new(TerminalNotifier);
    let id = match IllustId::from_target(target) {
        Ok(id) => id,
        Err(e) => {
            notifier.show(Toast::error("Invalid illustration id", format!("{:?}", target)));
            return Err(e.into());
        }
    };

    let orchestrator = build_orchestrator(cfg, settings, notifier, download_dir)?;
    match orchestrator.download_by_id(id).await {
        Some(summary) if summary.all_succeeded() => {
            println!("Downloaded {} page(s) of illustration {}", summary.total(), id);
            Ok(())
        }
        Some(summary) => anyhow::bail!(
            "{} of {} page(s) of illustration {} failed",
            summary.failed,
            summary.total(),
            id
        ),
        None => anyhow::bail!("nothing downloaded for illustration {}", id),
    }
}
