//! Application context shared by CLI commands.

use std::path::{Path, PathBuf};

use crate::catalog::{
    verify_index, verify_revocation_list, IndexCache, SignedCatalogIndex, SignedRevocationList,
};
use crate::cli::Cli;
use crate::config::{Config, ENV_PRIVATE_KEY};
use crate::error::{KkError, Result};
use crate::signing::{Keypair, PublicKey};

pub struct AppContext {
    pub config: Config,
    pub robot: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            config: Config::load(cli.config.as_deref())?,
            robot: cli.robot,
        })
    }

    pub fn skills_dir(&self) -> &Path {
        &self.config.skills.dir
    }

    /// The authority signing key, from the environment only. Clients
    /// never hold it; commands that sign require it explicitly.
    pub fn private_key(&self) -> Result<Keypair> {
        let encoded = std::env::var(ENV_PRIVATE_KEY).map_err(|_| {
            KkError::Config(format!("{ENV_PRIVATE_KEY} is not set; run `kithkit keygen` first"))
        })?;
        Keypair::from_base64(&encoded)
    }

    /// The catalog public key: env var first, config fallback.
    pub fn public_key(&self) -> Result<PublicKey> {
        let encoded = self
            .config
            .catalog
            .public_key
            .clone()
            .ok_or_else(|| {
                KkError::Config(
                    "no catalog public key configured (set KITHKIT_CATALOG_PUBLIC_KEY)".to_string(),
                )
            })?;
        PublicKey::from_base64(&encoded)
    }

    /// Load the signed index through the TTL cache, then verify its
    /// signature. Verification always happens, cached or not.
    pub fn load_index(&self) -> Result<SignedCatalogIndex> {
        let index_path = self.config.catalog.index_path.clone().ok_or_else(|| {
            KkError::Config("no catalog index_path configured".to_string())
        })?;
        let cache = IndexCache::new(self.config.cache_path(), self.config.cache.ttl_secs);
        let index = cache.get(|| fetch_index_file(&index_path))?;

        let public = self.public_key()?;
        if !verify_index(&index, &public) {
            return Err(KkError::Integrity(
                "catalog index signature verification failed".to_string(),
            ));
        }
        Ok(index)
    }

    /// Load and verify the revocation list when one is configured.
    pub fn load_revocations(&self) -> Result<Option<SignedRevocationList>> {
        let Some(path) = &self.config.catalog.revocations_path else {
            return Ok(None);
        };
        let list = SignedRevocationList::from_json(&std::fs::read_to_string(path)?)?;
        let public = self.public_key()?;
        if !verify_revocation_list(&list, &public) {
            return Err(KkError::Integrity(
                "revocation list signature verification failed".to_string(),
            ));
        }
        Ok(Some(list))
    }

    /// Fetch callback resolving index archive paths against the
    /// configured archive root.
    pub fn archive_fetcher(&self) -> Result<impl Fn(&str) -> Result<Vec<u8>> + '_> {
        let root = self
            .config
            .catalog
            .archive_root
            .clone()
            .ok_or_else(|| KkError::Config("no catalog archive_root configured".to_string()))?;
        Ok(move |archive: &str| -> Result<Vec<u8>> {
            let path = resolve_archive_path(&root, archive)?;
            std::fs::read(&path).map_err(|err| {
                KkError::Fetch(format!("read archive {}: {err}", path.display()))
            })
        })
    }
}

fn fetch_index_file(path: &Path) -> Result<SignedCatalogIndex> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| KkError::Fetch(format!("read index {}: {err}", path.display())))?;
    SignedCatalogIndex::from_json(&raw)
}

/// Resolve an `archives/...` path from the index against the archive
/// root, rejecting anything that would escape it.
fn resolve_archive_path(root: &Path, archive: &str) -> Result<PathBuf> {
    let relative = Path::new(archive);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(KkError::Invalid(format!("unsafe archive path: {archive}")));
    }
    Ok(root.join(relative))
}
