//! Configuration loading.
//!
//! Layered the usual way: built-in defaults, then the global config
//! file under the user's config directory, then an explicit `--config`
//! path, then environment overrides. Every section merges patch-style
//! so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KkError, Result};

pub const ENV_ROOT: &str = "KITHKIT_ROOT";
pub const ENV_CONFIG: &str = "KITHKIT_CONFIG";
pub const ENV_PRIVATE_KEY: &str = "KITHKIT_CATALOG_PRIVATE_KEY";
pub const ENV_PUBLIC_KEY: &str = "KITHKIT_CATALOG_PUBLIC_KEY";
pub const ENV_CACHE_TTL: &str = "KITHKIT_CACHE_TTL_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Where installed skills live.
    pub dir: PathBuf,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            dir: base.join(".kithkit/skills"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the signed index document.
    pub index_path: Option<PathBuf>,
    /// Directory the `archives/...` paths in the index resolve against.
    pub archive_root: Option<PathBuf>,
    /// Path to the signed revocation list, when one is distributed.
    pub revocations_path: Option<PathBuf>,
    /// Base64 SPKI DER public key; the env var wins when both are set.
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skills: SkillsConfig::default(),
            catalog: CatalogConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    skills: Option<SkillsPatch>,
    catalog: Option<CatalogPatch>,
    cache: Option<CachePatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillsPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    index_path: Option<PathBuf>,
    archive_root: Option<PathBuf>,
    revocations_path: Option<PathBuf>,
    public_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    ttl_secs: Option<i64>,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(patch) = Self::load_global()? {
            config.merge_patch(patch);
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(base) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&base.join("kithkit/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| KkError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| KkError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(skills) = patch.skills {
            if let Some(dir) = skills.dir {
                self.skills.dir = dir;
            }
        }
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.index_path {
                self.catalog.index_path = Some(path);
            }
            if let Some(path) = catalog.archive_root {
                self.catalog.archive_root = Some(path);
            }
            if let Some(path) = catalog.revocations_path {
                self.catalog.revocations_path = Some(path);
            }
            if let Some(key) = catalog.public_key {
                self.catalog.public_key = Some(key);
            }
        }
        if let Some(cache) = patch.cache {
            if let Some(ttl) = cache.ttl_secs {
                self.cache.ttl_secs = ttl;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(root) = std::env::var(ENV_ROOT) {
            self.skills.dir = PathBuf::from(root).join("skills");
        }
        if let Ok(key) = std::env::var(ENV_PUBLIC_KEY) {
            self.catalog.public_key = Some(key);
        }
        if let Ok(ttl) = std::env::var(ENV_CACHE_TTL) {
            self.cache.ttl_secs = ttl.parse().map_err(|_| {
                KkError::Config(format!("{ENV_CACHE_TTL} must be an integer, got {ttl}"))
            })?;
        }
        Ok(())
    }

    /// The index cache file lives inside the skills dir.
    pub fn cache_path(&self) -> PathBuf {
        self.skills.dir.join(".cache/index-cache.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert!(config.skills.dir.ends_with(".kithkit/skills"));
        assert_eq!(config.cache.ttl_secs, 3600);
        assert!(config.catalog.index_path.is_none());
    }

    #[test]
    fn partial_file_only_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nttl_secs = 60\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.skills.dir.ends_with(".kithkit/skills") || config.skills.dir.ends_with("skills"));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(KkError::Config(_))
        ));
    }

    #[test]
    fn cache_path_is_under_skills_dir() {
        let config = Config::default();
        assert!(config.cache_path().ends_with(".cache/index-cache.json"));
    }
}
