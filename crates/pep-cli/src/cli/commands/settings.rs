//! `pep settings` – show, save or reset the naming format.

use anyhow::Result;
use pep_core::naming::PLACEHOLDERS;
use pep_core::settings::{self, FileSettings, SettingsStore, NAMING_FORMAT_KEY};

use crate::cli::SettingsAction;

pub fn run_settings(store: &FileSettings, action: &SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let template = settings::naming_template(store)?;
            println!("settings file: {}", store.path().display());
            println!("naming_format = {:?}", template);
        }
        SettingsAction::SetFormat { template } => {
            save_naming_format(store, template)?;
            println!("naming_format = {:?}", template);
        }
        SettingsAction::Reset => {
            store.remove(NAMING_FORMAT_KEY);
            store.save()?;
            println!("naming_format reset to {:?}", settings::naming_template(store)?);
        }
    }
    Ok(())
}

/// Validates and persists a naming format.
pub(crate) fn save_naming_format(store: &FileSettings, template: &str) -> Result<()> {
    if template.trim().is_empty() {
        anyhow::bail!("naming format must not be empty");
    }
    for warning in format_warnings(template) {
        eprintln!("warning: {}", warning);
    }
    store.set(NAMING_FORMAT_KEY, template.into());
    store.save()?;
    tracing::info!("naming format saved: {}", template);
    Ok(())
}

/// Problems worth pointing out without refusing the format.
pub(crate) fn format_warnings(template: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if !PLACEHOLDERS.iter().any(|p| template.contains(p)) {
        warnings.push("format has no placeholder; every file gets the same name".to_string());
    } else if !template.contains("{p}") {
        warnings.push("format has no {p}; pages of one work will overwrite each other".to_string());
    }
    warnings
}
