//! Persisted show-name cache
//!
//! The document is `{"timestamp": <epoch seconds>, "shows": {url: name}}`.
//! Freshness is decided for the cache as a whole from its single
//! timestamp. Saving writes a unique temp file next to the target and
//! renames it over the target, so readers never see a half-written file.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Cached names older than this are not trusted
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const CACHE_FILE_NAME: &str = "mako_shows_cache.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Last-known-good show names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCache {
    /// Epoch seconds of the last save
    #[serde(default)]
    pub timestamp: f64,

    /// Show URL to display name
    #[serde(default)]
    pub shows: BTreeMap<String, String>,
}

impl NameCache {
    /// An empty cache stamped `now`
    pub fn empty(now: f64) -> Self {
        Self {
            timestamp: now,
            shows: BTreeMap::new(),
        }
    }

    /// Whether `now - timestamp` is inside [`CACHE_TTL`]
    pub fn is_fresh(&self, now: f64) -> bool {
        now - self.timestamp < CACHE_TTL.as_secs_f64()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.shows.get(url).map(String::as_str)
    }

    pub fn insert(&mut self, url: &str, name: &str) {
        self.shows.insert(url.to_string(), name.to_string());
    }

    /// Stamp the cache with the time it is being saved
    pub fn touch(&mut self, now: f64) {
        self.timestamp = now;
    }
}

/// Current time in epoch seconds
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// File-backed storage for a [`NameCache`]
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `mako_shows_cache.json` next to the running executable
    ///
    /// Falls back to the working directory when the executable path is
    /// unknown.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache, or an empty one stamped now if the file is absent
    /// or unreadable
    pub fn load(&self) -> NameCache {
        match self.try_load() {
            Ok(Some(cache)) => {
                debug!(path = %self.path.display(), shows = cache.shows.len(), "cache loaded");
                cache
            }
            Ok(None) => NameCache::empty(now_secs()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache unreadable, starting empty");
                NameCache::empty(now_secs())
            }
        }
    }

    fn try_load(&self) -> Result<Option<NameCache>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Atomically replace the cache file with `cache`
    pub fn save(&self, cache: &NameCache) -> Result<()> {
        let temp = self.stage(cache)?;
        self.commit(&temp)?;
        info!(path = %self.path.display(), shows = cache.shows.len(), "cache saved");
        Ok(())
    }

    /// Write `cache` to a fresh temp file beside the target
    ///
    /// The data is flushed to disk before this returns, so a later rename
    /// can never expose an empty file. The target is untouched until
    /// [`CacheStore::commit`].
    pub fn stage(&self, cache: &NameCache) -> Result<PathBuf> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let temp = dir.join(self.temp_name());
        let json = serde_json::to_string_pretty(cache)?;
        if let Err(e) = write_synced(&temp, json.as_bytes()) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(temp)
    }

    /// Rename a staged temp file over the target
    pub fn commit(&self, temp: &Path) -> Result<()> {
        if let Err(e) = fs::rename(temp, &self.path) {
            let _ = fs::remove_file(temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_name(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!(
            ".temp_cache_{}_{}_{}.json",
            std::process::id(),
            nanos,
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
