//! TTL cache for the fetched signed index.
//!
//! Caching never substitutes for verification: callers re-verify the
//! index signature after every `get`, cached or not.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SignedCatalogIndex;
use crate::error::Result;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    fetched_at: DateTime<Utc>,
    index: SignedCatalogIndex,
}

pub struct IndexCache {
    path: PathBuf,
    ttl: Duration,
}

impl IndexCache {
    pub fn new(path: PathBuf, ttl_secs: i64) -> Self {
        Self {
            path,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Return the cached index when fresh, otherwise call `fetch_fn`,
    /// persist the result, and return it. An unreadable or corrupt
    /// cache file counts as a miss.
    pub fn get(
        &self,
        fetch_fn: impl FnOnce() -> Result<SignedCatalogIndex>,
    ) -> Result<SignedCatalogIndex> {
        if let Some(index) = self.read_fresh() {
            debug!(path = %self.path.display(), "index cache hit");
            return Ok(index);
        }

        let index = fetch_fn()?;
        let record = CacheFile {
            fetched_at: Utc::now(),
            index,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(&record)?)?;
        Ok(record.index)
    }

    /// Remove the cache file. Missing file is not an error.
    pub fn invalidate(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn read_fresh(&self) -> Option<SignedCatalogIndex> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let record: CacheFile = serde_json::from_str(&raw).ok()?;
        if Utc::now() - record.fetched_at < self.ttl {
            Some(record.index)
        } else {
            None
        }
    }
}
