//! Single-instance guard for the interactive panel.
//!
//! Mounting creates a lock file holding the owner's pid. A second mount while
//! the owner is alive reports `Mount::AlreadyMounted` instead of opening a
//! second panel. Locks left behind by dead processes are reclaimed.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of trying to mount the panel.
#[derive(Debug)]
pub enum Mount {
    Mounted(PanelLock),
    AlreadyMounted { owner_pid: Option<u32> },
}

/// Held while the panel is open; removes the lock file on drop.
#[derive(Debug)]
pub struct PanelLock {
    path: PathBuf,
}

impl PanelLock {
    /// Default path for the lock: `~/.local/state/pep/panel.lock`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pep")?;
        Ok(xdg_dirs.place_state_file("panel.lock")?)
    }

    pub fn acquire(path: &Path) -> Result<Mount> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        // Second pass only after reclaiming a stale lock.
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id())
                        .with_context(|| format!("write lock: {}", path.display()))?;
                    tracing::debug!(path = %path.display(), "panel mounted");
                    return Ok(Mount::Mounted(PanelLock {
                        path: path.to_path_buf(),
                    }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let owner_pid = read_owner(path);
                    if owner_pid.map_or(false, process_alive) {
                        return Ok(Mount::AlreadyMounted { owner_pid });
                    }
                    tracing::debug!(path = %path.display(), "removing stale panel lock");
                    match std::fs::remove_file(path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            return Err(e)
                                .with_context(|| format!("remove stale lock: {}", path.display()))
                        }
                    }
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("create lock: {}", path.display()))
                }
            }
        }
        Ok(Mount::AlreadyMounted {
            owner_pid: read_owner(path),
        })
    }
}

impl Drop for PanelLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "could not remove panel lock: {}", e);
        }
    }
}

fn read_owner(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    Path::new("/proc").join(pid.to_string()).exists()
}
