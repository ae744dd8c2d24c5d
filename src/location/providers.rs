//! Reference data providers: remote SQL dumps, the dump cache, and the
//! built-in fallback dataset.

use super::cache::DumpCache;
use super::sql;
use super::store::{ReferenceStore, StoreBuilder};
use super::types::{CityRecord, DataSource, LocationError};
use crate::config::Config;
use serde::Serialize;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

pub const CITIES_URL: &str =
    "https://raw.githubusercontent.com/aslamanver/srilanka-cities/refs/heads/master/cities.sql";
pub const DISTRICTS_URL: &str =
    "https://raw.githubusercontent.com/aslamanver/srilanka-cities/refs/heads/master/districts.sql";

const USER_AGENT: &str = concat!("LankaRoute/", env!("CARGO_PKG_VERSION"));

// ─── Built-in dataset ───────────────────────────────────────────

struct FallbackCity {
    name: &'static str,
    lat: f64,
    lon: f64,
    postcode: &'static str,
    district_id: i64,
}

/// The ten largest urban centres, used when the city dump is unavailable.
const FALLBACK_CITIES: &[FallbackCity] = &[
    FallbackCity { name: "Colombo", lat: 6.9271, lon: 79.8612, postcode: "100", district_id: 15 },
    FallbackCity { name: "Matara", lat: 5.9483, lon: 80.5353, postcode: "81000", district_id: 21 },
    FallbackCity { name: "Galle", lat: 6.0535, lon: 80.2210, postcode: "80000", district_id: 20 },
    FallbackCity { name: "Kandy", lat: 7.2906, lon: 80.6337, postcode: "20000", district_id: 12 },
    FallbackCity { name: "Jaffna", lat: 9.6615, lon: 80.0255, postcode: "40000", district_id: 22 },
    FallbackCity { name: "Anuradhapura", lat: 8.3114, lon: 80.4037, postcode: "50000", district_id: 2 },
    FallbackCity { name: "Trincomalee", lat: 8.5922, lon: 81.2357, postcode: "31000", district_id: 7 },
    FallbackCity { name: "Batticaloa", lat: 7.7167, lon: 81.7000, postcode: "30000", district_id: 5 },
    FallbackCity { name: "Negombo", lat: 7.2086, lon: 79.8358, postcode: "11500", district_id: 15 },
    FallbackCity { name: "Ratnapura", lat: 6.6806, lon: 80.4022, postcode: "70000", district_id: 18 },
];

/// Fallback records. They carry no row id (0) and no local-language names.
pub fn fallback_cities() -> Vec<CityRecord> {
    FALLBACK_CITIES
        .iter()
        .map(|c| CityRecord {
            id: 0,
            district_id: c.district_id,
            name_en: c.name.to_string(),
            name_si: None,
            name_ta: None,
            sub_name_en: None,
            sub_name_si: None,
            sub_name_ta: None,
            postcode: Some(c.postcode.to_string()),
            latitude: c.lat,
            longitude: c.lon,
        })
        .collect()
}

/// A sealed store holding only the fallback cities and no districts.
pub fn fallback_store() -> ReferenceStore {
    let mut builder = StoreBuilder::new();
    builder.insert_records(fallback_cities());
    builder.seal(DataSource::Fallback, DataSource::Unavailable)
}

/// A city entry for the public city list.
#[derive(Debug, Clone, Serialize)]
pub struct CityInfo {
    pub name: String,
    pub city: String,
    pub district: Option<String>,
    pub postcode: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Every key in the store, in admission order.
pub fn city_list(store: &ReferenceStore) -> Vec<CityInfo> {
    store
        .cities()
        .map(|(key, rec)| CityInfo {
            name: key.to_string(),
            city: rec.name_en.clone(),
            district: store.district_by_id(rec.district_id).map(|d| d.name_en.clone()),
            postcode: rec.postcode.clone(),
            lat: rec.latitude,
            lon: rec.longitude,
        })
        .collect()
}

// ─── Remote dumps ───────────────────────────────────────────────

/// GET a text document.
pub fn fetch_text(url: &str, timeout: Duration) -> Result<String, LocationError> {
    let response = ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .timeout(timeout)
        .call()
        .map_err(|e| LocationError::Network(e.to_string()))?;

    response
        .into_string()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))
}

/// Builds the reference store once: both dumps are fetched concurrently and
/// joined before anything is ingested.
pub struct ReferenceLoader {
    config: Config,
}

impl ReferenceLoader {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn load(&self) -> ReferenceStore {
        let cache = self.config.cache_path.clone().map(|path| {
            Mutex::new(DumpCache::load_from(path).with_ttl_days(self.config.cache_ttl_days))
        });
        let cache = cache.as_ref();

        let (cities, districts) = thread::scope(|s| {
            let cities = s.spawn(|| self.fetch_dump(&self.config.cities_url, cache));
            let districts = s.spawn(|| self.fetch_dump(&self.config.districts_url, cache));
            (joined(cities.join()), joined(districts.join()))
        });

        let mut builder = StoreBuilder::new();

        let district_source = match districts {
            Ok((body, source)) => {
                let parsed = sql::district_rows(&body);
                if parsed.rows.is_empty() {
                    tracing::warn!(url = %self.config.districts_url, "district dump has no rows; district fallback disabled");
                    DataSource::Unavailable
                } else {
                    builder.ingest_districts(parsed.rows);
                    source
                }
            }
            Err(e) => {
                tracing::warn!(url = %self.config.districts_url, error = %e, "district data unavailable; district fallback disabled");
                DataSource::Unavailable
            }
        };

        let city_source = match cities {
            Ok((body, source)) => {
                builder.ingest_cities(sql::city_rows(&body).rows);
                if builder.city_count() == 0 {
                    let e = LocationError::NoData(self.config.cities_url.clone());
                    tracing::warn!(error = %e, "using built-in city set");
                    builder.insert_records(fallback_cities());
                    DataSource::Fallback
                } else {
                    source
                }
            }
            Err(e) => {
                tracing::warn!(url = %self.config.cities_url, error = %e, "city data unavailable; using built-in city set");
                builder.insert_records(fallback_cities());
                DataSource::Fallback
            }
        };

        builder.seal(city_source, district_source)
    }

    /// Cache (fresh) → network → error.
    fn fetch_dump(
        &self,
        url: &str,
        cache: Option<&Mutex<DumpCache>>,
    ) -> Result<(String, DataSource), LocationError> {
        if let Some(cache) = cache {
            let cache = cache
                .lock()
                .map_err(|_| LocationError::Cache("cache lock poisoned".into()))?;
            if let Some(body) = cache.get(url) {
                tracing::info!(url, "using cached dump");
                return Ok((body.to_string(), DataSource::Cache));
            }
        }

        if self.config.offline {
            return Err(LocationError::Network(format!("offline, no cached copy of {}", url)));
        }

        let body = fetch_text(url, Duration::from_secs(self.config.timeout_secs))?;
        tracing::info!(url, bytes = body.len(), "fetched dump");

        if let Some(cache) = cache {
            if let Ok(mut cache) = cache.lock() {
                if let Err(e) = cache.put(url, &body) {
                    tracing::warn!(url, error = %e, "could not cache dump");
                }
            }
        }

        Ok((body, DataSource::Remote))
    }
}

fn joined<T>(res: thread::Result<Result<T, LocationError>>) -> Result<T, LocationError> {
    res.unwrap_or_else(|_| Err(LocationError::Network("fetch thread panicked".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CITIES_SQL: &str = "INSERT INTO `cities` VALUES \
        (1, 5, 'Colombo 1', NULL, NULL, 'Fort', NULL, NULL, '00100', 6.9349, 79.8538), \
        (2, 12, 'Peradeniya', NULL, NULL, NULL, NULL, NULL, '20400', 7.2667, 80.6);";
    const DISTRICTS_SQL: &str = "INSERT INTO `districts` VALUES \
        (5, 1, 'Colombo', NULL, NULL), (12, 2, 'Kandy', NULL, NULL);";

    fn offline_config(dir: &TempDir) -> Config {
        Config {
            cities_url: "https://example.invalid/cities.sql".into(),
            districts_url: "https://example.invalid/districts.sql".into(),
            cache_path: Some(dir.path().join("dumps.json")),
            offline: true,
            ..Config::default()
        }
    }

    #[test]
    fn test_fallback_dataset() {
        let cities = fallback_cities();
        assert_eq!(cities.len(), 10);
        assert!(cities.iter().all(|c| c.id == 0 && c.postcode.is_some()));
        let kandy = cities.iter().find(|c| c.name_en == "Kandy").unwrap();
        assert_eq!(kandy.district_id, 12);
    }

    #[test]
    fn test_offline_without_cache_falls_back() {
        let dir = TempDir::new().unwrap();
        let store = ReferenceLoader::new(offline_config(&dir)).load();
        let stats = store.stats();
        assert_eq!(stats.city_source, DataSource::Fallback);
        assert_eq!(stats.district_source, DataSource::Unavailable);
        assert_eq!(stats.cities, 10);
        assert_eq!(stats.districts, 0);
    }

    #[test]
    fn test_offline_uses_cached_dumps() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(&dir);
        {
            let mut cache = DumpCache::load_from(config.cache_path.clone().unwrap());
            cache.put(&config.cities_url, CITIES_SQL).unwrap();
            cache.put(&config.districts_url, DISTRICTS_SQL).unwrap();
        }

        let store = ReferenceLoader::new(config).load();
        let stats = store.stats();
        assert_eq!(stats.city_source, DataSource::Cache);
        assert_eq!(stats.district_source, DataSource::Cache);
        assert_eq!(store.resolve("colombo").unwrap().record.name_en, "Colombo 1");
        assert_eq!(store.resolve("kandy").unwrap().record.name_en, "Peradeniya");
    }

    #[test]
    fn test_empty_city_dump_falls_back() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(&dir);
        {
            let mut cache = DumpCache::load_from(config.cache_path.clone().unwrap());
            cache.put(&config.cities_url, "<html>not found</html>").unwrap();
            cache.put(&config.districts_url, DISTRICTS_SQL).unwrap();
        }

        let store = ReferenceLoader::new(config).load();
        assert_eq!(store.stats().city_source, DataSource::Fallback);
        assert_eq!(store.stats().district_source, DataSource::Cache);
        assert!(store.city("Galle").is_some());
    }

    #[test]
    fn test_empty_district_dump_marked_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(&dir);
        {
            let mut cache = DumpCache::load_from(config.cache_path.clone().unwrap());
            cache.put(&config.cities_url, CITIES_SQL).unwrap();
            cache.put(&config.districts_url, "").unwrap();
        }

        let store = ReferenceLoader::new(config).load();
        let stats = store.stats();
        assert_eq!(stats.city_source, DataSource::Cache);
        assert_eq!(stats.district_source, DataSource::Unavailable);
        assert_eq!(stats.district_source.to_string(), "Unavailable");
        assert_eq!(stats.districts, 0);
    }

    #[test]
    fn test_city_list_order_and_district_names() {
        let dir = TempDir::new().unwrap();
        let config = offline_config(&dir);
        {
            let mut cache = DumpCache::load_from(config.cache_path.clone().unwrap());
            cache.put(&config.cities_url, CITIES_SQL).unwrap();
            cache.put(&config.districts_url, DISTRICTS_SQL).unwrap();
        }
        let store = ReferenceLoader::new(config).load();
        let list = city_list(&store);
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Colombo 1", "Peradeniya", "Colombo"]);
        assert_eq!(list[1].district.as_deref(), Some("Kandy"));
        assert_eq!(list[2].city, "Colombo 1");
    }
}
