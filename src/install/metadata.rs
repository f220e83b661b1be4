//! Install metadata sidecar.
//!
//! A hidden JSON file inside each install directory records what was
//! installed and from where. Writing it is the last step of an install,
//! so its presence is the commit marker: a directory without it is a
//! failed or in-progress install.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::manifest::TrustLevel;

pub const METADATA_FILE: &str = ".kithkit-meta.json";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallMetadata {
    pub name: String,
    pub version: String,
    /// The archive path or URL the bytes were fetched from.
    pub source: String,
    pub sha256: String,
    pub signature: String,
    pub installed_at: String,
    pub trust_level: TrustLevel,
}

impl InstallMetadata {
    /// Read the sidecar, if the directory has a readable one.
    pub fn load(install_dir: &Path) -> Result<Option<Self>> {
        let path = install_dir.join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(metadata) => Ok(Some(metadata)),
            // A corrupt sidecar means the directory is not a valid
            // install; callers treat it as absent.
            Err(_) => Ok(None),
        }
    }

    /// Write the sidecar, pretty-printed for human inspection.
    pub fn write(&self, install_dir: &Path) -> Result<()> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        std::fs::write(install_dir.join(METADATA_FILE), body)?;
        Ok(())
    }
}
