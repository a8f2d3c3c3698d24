//! `pep panel` – interactive settings and download panel on stdin/stdout.
//!
//! One panel per user: a second `pep panel` finds the lock and exits.

use anyhow::Result;
use pep_core::config::PepConfig;
use pep_core::illust_id::IllustId;
use pep_core::mount::{Mount, PanelLock};
use pep_core::naming::DEFAULT_NAMING_TEMPLATE;
use pep_core::notify::{Notifier, TerminalNotifier, Toast};
use pep_core::settings::{self, FileSettings, SettingsStore};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::build_orchestrator;
use super::settings::save_naming_format;

const HELP: &str = "\
commands:
  download          download the illustration from --page-url
  id <number>       download an illustration by id
  format <template> edit the naming format ({title} {author} {id} {p})
  save              save the edited naming format
  show              show current settings
  help              show this help
  close             close the panel";

/// One line of panel input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Empty,
    DownloadCurrent,
    DownloadId(IllustId),
    SetFormat(String),
    Save,
    Show,
    Help,
    Close,
}

/// Parses a panel line. Errors are user-facing messages.
pub fn parse_action(line: &str) -> Result<PanelAction, String> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    let action = match cmd {
        "" => PanelAction::Empty,
        "download" | "d" => PanelAction::DownloadCurrent,
        "id" => PanelAction::DownloadId(IllustId::parse(arg).map_err(|e| e.to_string())?),
        "format" | "f" => {
            if arg.is_empty() {
                return Err("format needs a template, e.g. format {title}-{p}".to_string());
            }
            PanelAction::SetFormat(arg.to_string())
        }
        "save" => PanelAction::Save,
        "show" => PanelAction::Show,
        "help" | "?" => PanelAction::Help,
        "close" | "quit" | "q" | "exit" => PanelAction::Close,
        other => return Err(format!("unknown command {:?}; type help", other)),
    };
    Ok(action)
}

/// Saved naming template. A stored value of the wrong type is reported and the
/// default template is used instead.
pub fn saved_template(store: &dyn SettingsStore, notifier: &dyn Notifier) -> String {
    match settings::naming_template(store) {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!("unreadable naming format, using default: {}", e);
            notifier.show(Toast::error(
                "Invalid naming format",
                format!("{}; using {}", e, DEFAULT_NAMING_TEMPLATE),
            ));
            DEFAULT_NAMING_TEMPLATE.to_string()
        }
    }
}

pub async fn run_panel(
    cfg: &PepConfig,
    store: Arc<FileSettings>,
    page_url: Option<&str>,
    download_dir: Option<&Path>,
) -> Result<()> {
    let _lock = match PanelLock::acquire(&PanelLock::default_path()?)? {
        Mount::Mounted(lock) => lock,
        Mount::AlreadyMounted { owner_pid } => {
            match owner_pid {
                Some(pid) => println!("Panel already open (pid {}).", pid),
                None => println!("Panel already open."),
            }
            return Ok(());
        }
    };

    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
    let current = page_url.and_then(IllustId::from_page_url);
    let orchestrator =
        build_orchestrator(cfg, store.clone(), Arc::clone(&notifier), download_dir)?;
    let mut pending = saved_template(&*store, &*notifier);

    println!("pep panel");
    match current {
        Some(id) => println!("current illustration: {}", id),
        None => println!("no illustration on this page"),
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("pep> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let action = match parse_action(&line) {
            Ok(action) => action,
            Err(msg) => {
                notifier.show(Toast::error("Invalid input", msg));
                continue;
            }
        };
        match action {
            PanelAction::Empty => {}
            PanelAction::DownloadCurrent => match current {
                Some(id) => {
                    orchestrator.download_by_id(id).await;
                }
                None => notifier.show(Toast::error(
                    "No illustration",
                    "open the panel with --page-url <artworks url>",
                )),
            },
            PanelAction::DownloadId(id) => {
                orchestrator.download_by_id(id).await;
            }
            PanelAction::SetFormat(template) => {
                println!("naming format (unsaved): {}", template);
                pending = template;
            }
            PanelAction::Save => match save_naming_format(&store, &pending) {
                Ok(()) => notifier.show(Toast::success("Settings saved", pending.clone())),
                Err(e) => notifier.show(Toast::error("Settings not saved", format!("{:#}", e))),
            },
            PanelAction::Show => {
                println!("naming format (saved):   {}", saved_template(&*store, &*notifier));
                println!("naming format (editing): {}", pending);
                println!("settings file: {}", store.path().display());
            }
            PanelAction::Help => println!("{}", HELP),
            PanelAction::Close => break,
        }
    }
    tracing::debug!("panel closed");
    Ok(())
}
