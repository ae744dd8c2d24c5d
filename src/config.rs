use crate::location::cache::{DumpCache, DEFAULT_TTL_DAYS};
use crate::location::providers::{CITIES_URL, DISTRICTS_URL};
use std::path::PathBuf;

/// Reference-data settings shared by the CLI and the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub cities_url: String,
    pub districts_url: String,
    /// `None` disables the dump cache.
    pub cache_path: Option<PathBuf>,
    pub cache_ttl_days: i64,
    /// Skip the network; only the cache and built-in data are used.
    pub offline: bool,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cities_url: CITIES_URL.to_string(),
            districts_url: DISTRICTS_URL.to_string(),
            cache_path: Some(DumpCache::default_path()),
            cache_ttl_days: DEFAULT_TTL_DAYS,
            offline: false,
            timeout_secs: 15,
        }
    }
}
