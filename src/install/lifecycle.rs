//! Lifecycle operations over installed skills: update, uninstall, list.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::metadata::{InstallMetadata, CONFIG_FILE};
use super::{install, InstallOptions};
use crate::catalog::{compare_versions, SignedCatalogIndex};
use crate::error::{KkError, Result};
use crate::manifest::TrustLevel;

const BACKUPS_DIR: &str = ".backups";

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheck {
    pub name: String,
    pub installed: Option<String>,
    pub latest: Option<String>,
    pub has_update: bool,
}

/// Compare the installed version against the index entry's `latest`.
/// Never an error: a skill that is not installed or not in the index
/// simply has `has_update = false`.
pub fn check_for_update(
    name: &str,
    skills_dir: &Path,
    index: &SignedCatalogIndex,
) -> Result<UpdateCheck> {
    let installed = InstallMetadata::load(&skills_dir.join(name))?.map(|meta| meta.version);
    let latest = index.entry(name).map(|entry| entry.latest.clone());
    let has_update = match (&installed, &latest) {
        (Some(current), Some(latest)) => compare_versions(current, latest).is_lt(),
        _ => false,
    };
    Ok(UpdateCheck {
        name: name.to_string(),
        installed,
        latest,
        has_update,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatus {
    pub name: String,
    pub updated: bool,
    /// The version now installed (or still installed when no update ran).
    pub version: Option<String>,
    pub config_preserved: bool,
    pub message: String,
}

/// Update a skill to the index's latest version, preserving the user's
/// config bytes verbatim across the reinstall.
pub fn update(opts: &InstallOptions<'_>) -> Result<UpdateStatus> {
    let check = check_for_update(opts.name, opts.skills_dir, opts.index)?;
    if !check.has_update {
        let message = match &check.installed {
            Some(version) => format!("{} {version} is up to date", opts.name),
            None => format!("{} is not installed", opts.name),
        };
        return Ok(UpdateStatus {
            name: opts.name.to_string(),
            updated: false,
            version: check.installed,
            config_preserved: false,
            message,
        });
    }

    let install_dir = opts.skills_dir.join(opts.name);
    let config_path = install_dir.join(CONFIG_FILE);
    let preserved = if config_path.exists() {
        Some(std::fs::read(&config_path)?)
    } else {
        None
    };

    std::fs::remove_dir_all(&install_dir)?;
    let outcome = install(&InstallOptions {
        version: None,
        ..*opts
    })?;

    let config_preserved = preserved.is_some();
    if let Some(bytes) = preserved {
        std::fs::write(outcome.install_dir.join(CONFIG_FILE), bytes)?;
    }

    info!(skill = opts.name, version = %outcome.version, "updated");
    Ok(UpdateStatus {
        name: opts.name.to_string(),
        updated: true,
        version: Some(outcome.version),
        config_preserved,
        message: format!(
            "{} updated {} -> {}",
            opts.name,
            check.installed.as_deref().unwrap_or("?"),
            check.latest.as_deref().unwrap_or("?")
        ),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct UninstallOutcome {
    pub name: String,
    pub config_backed_up: bool,
}

/// Remove an installed skill, backing up its config file first.
pub fn uninstall(name: &str, skills_dir: &Path) -> Result<UninstallOutcome> {
    let install_dir = skills_dir.join(name);
    if InstallMetadata::load(&install_dir)?.is_none() {
        return Err(KkError::NotInstalled(name.to_string()));
    }

    let config_path = install_dir.join(CONFIG_FILE);
    let config_backed_up = if config_path.exists() {
        let backup_dir = skills_dir.join(BACKUPS_DIR).join(name);
        std::fs::create_dir_all(&backup_dir)?;
        std::fs::copy(&config_path, backup_dir.join("config.bak"))?;
        true
    } else {
        false
    };

    std::fs::remove_dir_all(&install_dir)?;
    info!(skill = name, config_backed_up, "uninstalled");
    Ok(UninstallOutcome {
        name: name.to_string(),
        config_backed_up,
    })
}

/// The backed-up config bytes from a previous uninstall, if any.
pub fn restore_backup(name: &str, skills_dir: &Path) -> Result<Option<Vec<u8>>> {
    let path = skills_dir.join(BACKUPS_DIR).join(name).join("config.bak");
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledSkill {
    pub name: String,
    pub version: String,
    pub trust_level: TrustLevel,
    pub installed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

/// Enumerate installed skills: non-hidden subdirectories with readable
/// metadata. With an index, each row also carries update information.
pub fn list_installed(
    skills_dir: &Path,
    index: Option<&SignedCatalogIndex>,
) -> Result<Vec<InstalledSkill>> {
    let mut out = Vec::new();
    if !skills_dir.exists() {
        return Ok(out);
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(skills_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        let Some(meta) = InstallMetadata::load(&dir)? else {
            continue;
        };
        let (has_update, latest_version) = match index {
            Some(index) => {
                let check = check_for_update(&meta.name, skills_dir, index)?;
                (Some(check.has_update), check.latest)
            }
            None => (None, None),
        };
        out.push(InstalledSkill {
            name: meta.name,
            version: meta.version,
            trust_level: meta.trust_level,
            installed_at: meta.installed_at,
            has_update,
            latest_version,
        });
    }
    Ok(out)
}
