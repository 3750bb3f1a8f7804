//! Request cache persisted as a single JSON file
//!
//! The whole store is read on every load and rewritten on every save. Entries carry
//! an explicit `kind` discriminator so page text and decoded API envelopes share one
//! representation.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

/// File name of the cache inside the cache directory
const CACHE_FILE_NAME: &str = "cache.json";

/// Errors that can occur when reading or writing the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing or renaming the cache file failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory store could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The persisted store exists but is not a valid cache document
    #[error("Cache file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// Discriminator stored alongside every cache body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Raw page markup
    Html,
    /// Decoded JSON document
    Json,
}

/// A cached response body
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Html(String),
    Json(Value),
}

impl CachedValue {
    pub fn kind(&self) -> EntryKind {
        match self {
            CachedValue::Html(_) => EntryKind::Html,
            CachedValue::Json(_) => EntryKind::Json,
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            CachedValue::Html(text) => Some(text),
            CachedValue::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            CachedValue::Json(value) => Some(value),
            CachedValue::Html(_) => None,
        }
    }
}

/// One cached response plus the time it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawEntry", try_from = "RawEntry")]
pub struct CacheEntry {
    pub value: CachedValue,
    pub cached_at: DateTime<Utc>,
}

/// On-disk shape of a cache entry
#[derive(Serialize, Deserialize)]
struct RawEntry {
    kind: EntryKind,
    body: Value,
    cached_at: DateTime<Utc>,
}

impl From<CacheEntry> for RawEntry {
    fn from(entry: CacheEntry) -> Self {
        let kind = entry.value.kind();
        let body = match entry.value {
            CachedValue::Html(text) => Value::String(text),
            CachedValue::Json(value) => value,
        };
        RawEntry {
            kind,
            body,
            cached_at: entry.cached_at,
        }
    }
}

impl TryFrom<RawEntry> for CacheEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let value = match (raw.kind, raw.body) {
            (EntryKind::Html, Value::String(text)) => CachedValue::Html(text),
            (EntryKind::Html, _) => return Err("html entry body must be a string".to_string()),
            (EntryKind::Json, body) => CachedValue::Json(body),
        };
        Ok(CacheEntry {
            value,
            cached_at: raw.cached_at,
        })
    }
}

impl CacheEntry {
    /// Wraps a value stamped with the current time
    pub fn new(value: CachedValue) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }
}

/// In-memory image of the whole cache file
///
/// Keys are page URLs for page fetches and postal codes for vicinity lookups.
/// A `BTreeMap` keeps serialization order stable, so saving an unchanged store
/// reproduces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStore {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Inserts or replaces the entry under `key`
    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How long a cached entry may be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Cached values are trusted until the cache file is removed
    #[default]
    NeverExpire,
    /// Entries older than the given age are fetched again
    Ttl(Duration),
}

impl CachePolicy {
    /// Builds a policy from an optional TTL in hours
    ///
    /// Returns `None` when the TTL is too large to represent.
    pub fn from_ttl_hours(hours: Option<u64>) -> Option<Self> {
        match hours {
            Some(hours) => i64::try_from(hours)
                .ok()
                .and_then(Duration::try_hours)
                .map(CachePolicy::Ttl),
            None => Some(CachePolicy::NeverExpire),
        }
    }

    /// Returns whether `entry` may still be served at time `now`
    pub fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match self {
            CachePolicy::NeverExpire => true,
            CachePolicy::Ttl(ttl) => now - entry.cached_at <= *ttl,
        }
    }
}

/// Handle on the persisted cache file
///
/// The file is loaded fully on each access and replaced fully on each save, so
/// two processes sharing one file can lose each other's updates. Within a
/// process, go through a single `Fetcher`, which serializes the
/// load-modify-save cycle.
#[derive(Debug, Clone)]
pub struct RequestCache {
    path: PathBuf,
}

impl RequestCache {
    /// Creates a RequestCache in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/npsites/cache.json` on Linux. Returns `None` if the cache
    /// directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        Self::default_dir().map(|dir| Self::with_path(dir.join(CACHE_FILE_NAME)))
    }

    /// Creates a RequestCache backed by a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user cache directory for this application
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "npsites")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted store
    ///
    /// A missing file is an empty store. A corrupt file is logged and also yields
    /// an empty store; nothing from a file that fails to parse is kept.
    pub fn load(&self) -> CacheStore {
        match self.try_load() {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "discarding unreadable cache");
                CacheStore::new()
            }
        }
    }

    /// Reads the persisted store, reporting why it could not be read
    pub fn try_load(&self) -> Result<CacheStore, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CacheStore::new()),
            Err(err) => {
                return Err(CacheError::Corrupt {
                    path: self.path.clone(),
                    reason: err.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|err| CacheError::Corrupt {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    /// Replaces the persisted store with `store`
    ///
    /// The document is written to a temporary file next to the target and renamed
    /// over it, so readers see either the old or the new contents.
    pub fn save(&self, store: &CacheStore) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(store)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Deletes the persisted store; a missing file is not an error
    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
