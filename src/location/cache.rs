//! File-based cache of fetched reference dumps at ~/.lanka-route/dumps.json.
//!
//! Keyed by source URL. Default TTL: 30 days.

use super::types::LocationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TTL_DAYS: i64 = 30;
const DAY_MS: i64 = 24 * 3600 * 1000;

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    body: String,
    timestamp: i64,
}

/// The dump cache.
pub struct DumpCache {
    path: PathBuf,
    ttl_ms: i64,
    entries: HashMap<String, CacheEntry>,
}

impl DumpCache {
    /// Load cache from a specific path.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            ttl_ms: DEFAULT_TTL_DAYS * DAY_MS,
            entries,
        }
    }

    pub fn with_ttl_days(mut self, days: i64) -> Self {
        self.ttl_ms = days.max(0) * DAY_MS;
        self
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lanka-route")
            .join("dumps.json")
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable dump cache");
                None
            }
        }
    }

    /// Cached body for `url`. `None` if missing or expired.
    pub fn get(&self, url: &str) -> Option<&str> {
        let entry = self.entries.get(url)?;
        let now = chrono::Utc::now().timestamp_millis();
        if now - entry.timestamp > self.ttl_ms {
            return None; // expired
        }
        Some(entry.body.as_str())
    }

    /// Store a fetched body and persist to disk.
    pub fn put(&mut self, url: &str, body: &str) -> Result<(), LocationError> {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                body: body.to_string(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        );
        self.persist()
    }

    fn persist(&self) -> Result<(), LocationError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LocationError::Cache(e.to_string()))?;
        }
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| LocationError::Cache(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| LocationError::Cache(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "https://example.org/cities.sql";

    fn test_cache() -> (DumpCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dumps.json");
        (DumpCache::load_from(path), dir)
    }

    #[test]
    fn test_cache_put_get() {
        let (mut cache, _dir) = test_cache();
        cache.put(URL, "INSERT INTO `cities` VALUES ();").unwrap();
        assert_eq!(cache.get(URL), Some("INSERT INTO `cities` VALUES ();"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let (cache, _dir) = test_cache();
        assert!(cache.get(URL).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dumps.json");

        {
            let mut cache = DumpCache::load_from(path.clone());
            cache.put(URL, "body").unwrap();
        }

        let cache2 = DumpCache::load_from(path);
        assert_eq!(cache2.get(URL), Some("body"));
    }

    #[test]
    fn test_cache_expired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dumps.json");
        let stale = format!(r#"{{"{}": {{"body": "old", "timestamp": 0}}}}"#, URL);
        fs::write(&path, stale).unwrap();

        let cache = DumpCache::load_from(path);
        assert!(cache.get(URL).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_expires_everything() {
        let (mut cache, _dir) = test_cache();
        cache.put(URL, "body").unwrap();
        let cache = cache.with_ttl_days(0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get(URL).is_none());
    }

    #[test]
    fn test_entry_file_layout() {
        let (mut cache, dir) = test_cache();
        cache.put(URL, "body").unwrap();
        let raw = fs::read_to_string(dir.path().join("dumps.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = json[URL].as_object().unwrap();
        let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["body", "timestamp"]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dumps.json");
        fs::write(&path, "not json").unwrap();
        assert!(DumpCache::load_from(path).is_empty());
    }
}
