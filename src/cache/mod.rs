//! File-based cache of remote responses.
//!
//! One JSON file per `(kind, key)` entry, stored under a per-kind
//! subdirectory with a SHA-256 file name. Entries are written once per remote
//! call and never expire; [`FileCache::remove`] and [`FileCache::clear`] are
//! the only invalidation.
//!
//! A definite "not found" (or an empty answer) is stored as a marker entry so
//! a later run answers it without asking the service again. Transport
//! failures are never stored.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{BomError, CacheErrorKind, Result};

/// The kind of remote call a cache entry answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheKind {
    SearchByNumber,
    DetailsByNumber,
    DetailsById,
    StructureById { depth: usize },
    StructureByNumber { depth: usize },
}

impl CacheKind {
    /// Subdirectory name for this kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SearchByNumber => "search_by_number",
            Self::DetailsByNumber => "details_by_number",
            Self::DetailsById => "details_by_id",
            Self::StructureById { .. } => "structure_by_id",
            Self::StructureByNumber { .. } => "structure_by_number",
        }
    }

    const fn depth(&self) -> Option<usize> {
        match self {
            Self::StructureById { depth } | Self::StructureByNumber { depth } => Some(*depth),
            _ => None,
        }
    }

    /// Every subdirectory label.
    pub const LABELS: [&'static str; 5] = [
        "search_by_number",
        "details_by_number",
        "details_by_id",
        "structure_by_id",
        "structure_by_number",
    ];

    /// Filesystem-safe file name for `key` under this kind.
    #[must_use]
    pub fn filename(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "kind:{}|depth:{:?}|key:{}",
            self.label(),
            self.depth(),
            key
        ));
        format!("{:x}.json", hasher.finalize())
    }
}

/// On-disk envelope around a cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub kind: CacheKind,
    pub key: String,
    pub fetched_at: DateTime<Utc>,
    /// The service had nothing for this key
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_found: bool,
    #[serde(default)]
    pub response: Value,
}

/// What the cache knows about a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedAnswer {
    /// A stored, non-empty response
    Found(Value),
    /// A stored "not found" marker
    NotFound,
}

/// Whether a response carries no data (`null`, `{}`, `[]`, `""`).
#[must_use]
pub fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// File-based response cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    /// Open (creating if needed) a cache rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| {
                BomError::cache(
                    cache_dir.display().to_string(),
                    CacheErrorKind::DirectoryUnavailable(e.to_string()),
                )
            })?;
        }
        Ok(Self { cache_dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path(&self, kind: CacheKind, key: &str) -> PathBuf {
        self.cache_dir.join(kind.label()).join(kind.filename(key))
    }

    /// Cached answer for `(kind, key)`.
    ///
    /// Returns `None` when absent or unreadable, and for an empty response
    /// written without the not-found flag.
    #[must_use]
    pub fn get(&self, kind: CacheKind, key: &str) -> Option<CachedAnswer> {
        let data = fs::read_to_string(self.path(kind, key)).ok()?;
        let entry: CacheEntry = serde_json::from_str(&data).ok()?;
        if entry.not_found {
            return Some(CachedAnswer::NotFound);
        }
        (!is_empty_response(&entry.response)).then_some(CachedAnswer::Found(entry.response))
    }

    #[must_use]
    pub fn contains(&self, kind: CacheKind, key: &str) -> bool {
        self.get(kind, key).is_some()
    }

    /// Store a response. Empty responses are not written; use
    /// [`FileCache::put_not_found`] for those.
    ///
    /// Returns whether an entry was written.
    pub fn put(&self, kind: CacheKind, key: &str, response: &Value) -> Result<bool> {
        if is_empty_response(response) {
            return Ok(false);
        }
        self.write(kind, key, false, response.clone())?;
        Ok(true)
    }

    /// Remember that the service has nothing for `(kind, key)`.
    pub fn put_not_found(&self, kind: CacheKind, key: &str) -> Result<()> {
        self.write(kind, key, true, Value::Null)
    }

    fn write(&self, kind: CacheKind, key: &str, not_found: bool, response: Value) -> Result<()> {
        let path = self.path(kind, key);
        let write_failed = |e: std::io::Error| {
            BomError::cache(
                path.display().to_string(),
                CacheErrorKind::WriteFailed(e.to_string()),
            )
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        let entry = CacheEntry {
            kind,
            key: key.to_string(),
            fetched_at: Utc::now(),
            not_found,
            response,
        };
        let data = serde_json::to_string(&entry)?;
        fs::write(&path, data).map_err(write_failed)
    }

    /// Remove one entry.
    pub fn remove(&self, kind: CacheKind, key: &str) -> Result<()> {
        let path = self.path(kind, key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| BomError::io(&path, e))?;
        }
        Ok(())
    }

    /// Remove every entry. Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for label in CacheKind::LABELS {
            let dir = self.cache_dir.join(label);
            if !dir.exists() {
                continue;
            }
            for entry in fs::read_dir(&dir).map_err(|e| BomError::io(&dir, e))? {
                let entry = entry?;
                if is_json(&entry.path()) && fs::remove_file(entry.path()).is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Entry counts and total size.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for label in CacheKind::LABELS {
            let Ok(entries) = fs::read_dir(self.cache_dir.join(label)) else {
                continue;
            };
            let mut count = 0;
            for entry in entries.flatten() {
                if !is_json(&entry.path()) {
                    continue;
                }
                count += 1;
                if let Ok(metadata) = entry.metadata() {
                    stats.total_size += metadata.len();
                }
                if is_marker(&entry.path()) {
                    stats.not_found_entries += 1;
                }
            }
            if count > 0 {
                stats.by_kind.insert(label.to_string(), count);
            }
            stats.total_entries += count;
        }
        stats
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

fn is_marker(path: &Path) -> bool {
    fs::read_to_string(path)
        .ok()
        .and_then(|data| serde_json::from_str::<CacheEntry>(&data).ok())
        .is_some_and(|entry| entry.not_found)
}

/// Cache statistics.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Total number of cached entries
    pub total_entries: usize,
    /// Total size in bytes
    pub total_size: u64,
    /// Entries recording a "not found" answer
    pub not_found_entries: usize,
    /// Entry count per kind label
    pub by_kind: IndexMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_filename_distinguishes_kind_and_depth() {
        let a = CacheKind::StructureById { depth: 3 }.filename("OR:1");
        let b = CacheKind::StructureById { depth: 2 }.filename("OR:1");
        let c = CacheKind::DetailsById.filename("OR:1");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, CacheKind::StructureById { depth: 3 }.filename("OR:1"));
        assert!(a.ends_with(".json"));
    }

    #[test]
    fn test_put_get_remove() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("cache")).unwrap();
        let kind = CacheKind::DetailsByNumber;

        assert!(cache.get(kind, "100").is_none());
        assert!(cache.put(kind, "100", &json!({"Name": "Frame"})).unwrap());
        assert_eq!(
            cache.get(kind, "100"),
            Some(CachedAnswer::Found(json!({"Name": "Frame"})))
        );
        assert!(cache.get(CacheKind::DetailsById, "100").is_none());

        cache.remove(kind, "100").unwrap();
        assert!(!cache.contains(kind, "100"));
    }

    #[test]
    fn test_empty_responses_not_written() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        assert!(!cache.put(CacheKind::SearchByNumber, "x", &json!([])).unwrap());
        assert!(!cache.put(CacheKind::SearchByNumber, "x", &Value::Null).unwrap());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_not_found_marker() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        let kind = CacheKind::StructureByNumber { depth: 2 };

        cache.put_not_found(kind, "LEAF").unwrap();
        assert_eq!(cache.get(kind, "LEAF"), Some(CachedAnswer::NotFound));
        assert!(cache.contains(kind, "LEAF"));
        assert!(cache.get(CacheKind::StructureByNumber { depth: 3 }, "LEAF").is_none());

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.not_found_entries, 1);
    }

    #[test]
    fn test_entry_without_flag_still_reads() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        let kind = CacheKind::DetailsById;
        let path = dir.path().join(kind.label()).join(kind.filename("OR:1"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"kind":{"type":"details_by_id"},"key":"OR:1","fetched_at":"2024-01-01T00:00:00Z","response":{"Name":"X"}}"#,
        )
        .unwrap();
        assert_eq!(
            cache.get(kind, "OR:1"),
            Some(CachedAnswer::Found(json!({"Name": "X"})))
        );
    }

    #[test]
    fn test_stats_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache
            .put(CacheKind::SearchByNumber, "1", &json!([{"ID": "OR:1"}]))
            .unwrap();
        cache
            .put(CacheKind::StructureById { depth: 2 }, "OR:1", &json!({"Number": "1"}))
            .unwrap();
        cache
            .put(CacheKind::StructureById { depth: 3 }, "OR:1", &json!({"Number": "1"}))
            .unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_kind["structure_by_id"], 2);
        assert!(stats.total_size > 0);

        assert_eq!(cache.clear().unwrap(), 3);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        let kind = CacheKind::DetailsById;
        let path = dir.path().join(kind.label()).join(kind.filename("OR:9"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();
        assert!(cache.get(kind, "OR:9").is_none());
    }
}
