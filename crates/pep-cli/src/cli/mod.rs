//! CLI for pep.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pep_core::config;
use pep_core::settings::FileSettings;
use std::path::PathBuf;
use std::sync::Arc;

use commands::{run_download, run_panel, run_settings};

/// Top-level CLI for pep.
#[derive(Debug, Parser)]
#[command(name = "pep")]
#[command(about = "pep: download every page of a pixiv illustration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every page of an illustration.
    Download {
        /// Numeric illustration id, or an artworks page URL.
        target: String,
        /// Save into DIR instead of the configured download directory.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Show or change saved settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Open the interactive settings and download panel.
    Panel {
        /// Address of the page being viewed; enables the `download` action.
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,
        /// Save into DIR instead of the configured download directory.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the saved naming format.
    Show,
    /// Save a new naming format (placeholders: {title} {author} {id} {p}).
    SetFormat {
        template: String,
    },
    /// Forget the saved naming format.
    Reset,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let settings = Arc::new(FileSettings::load_default()?);

        match cli.command {
            CliCommand::Download {
                target,
                download_dir,
            } => run_download(&cfg, settings, &target, download_dir.as_deref()).await?,
            CliCommand::Settings { action } => run_settings(&settings, &action)?,
            CliCommand::Panel {
                page_url,
                download_dir,
            } => {
                run_panel(&cfg, settings, page_url.as_deref(), download_dir.as_deref()).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
