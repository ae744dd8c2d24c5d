//! Location resolver — the ordered matching chain.
//!
//! Token flow:  exact city → partial city → alias → district fallback →
//!              full-token exact → full-token partial → no match

use super::normalize::normalize;
use super::store::ReferenceStore;
use super::types::{MatchStrategy, ResolvedCity};

/// Resolves place-name tokens against a sealed store.
///
/// Borrowing the store keeps resolution a pure read; build one per request
/// or share one across threads.
#[derive(Debug, Clone, Copy)]
pub struct LocationResolver<'a> {
    store: &'a ReferenceStore,
}

/// A token split into its "district-city" halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'t> {
    pub city: &'t str,
    pub district: &'t str,
}

/// "matara-galle" → city "galle", district "matara". Without a hyphen the
/// whole token plays both roles. Extra segments are ignored.
pub fn split_token(token: &str) -> TokenParts<'_> {
    let mut parts = token.split('-');
    let first = parts.next().unwrap_or("");
    match parts.next() {
        Some(second) => TokenParts {
            city: second,
            district: first,
        },
        None => TokenParts {
            city: first,
            district: first,
        },
    }
}

impl<'a> LocationResolver<'a> {
    pub fn new(store: &'a ReferenceStore) -> Self {
        Self { store }
    }

    /// Resolve a token to its best city, or `None` for an unrecognized name.
    pub fn resolve(&self, token: &str) -> Option<ResolvedCity> {
        if token.is_empty() {
            return None;
        }

        let parts = split_token(token);
        let city_key = normalize(parts.city);
        let district_key = normalize(parts.district);

        let hit = self
            .exact(&city_key)
            .map(|slot| (slot, MatchStrategy::ExactCity))
            .or_else(|| {
                self.partial(&city_key)
                    .map(|slot| (slot, MatchStrategy::PartialCity))
            })
            .or_else(|| {
                self.alias(&city_key)
                    .map(|slot| (slot, MatchStrategy::Alias))
            })
            .or_else(|| {
                self.district_fallback(&district_key)
                    .map(|slot| (slot, MatchStrategy::DistrictFallback))
            })
            .or_else(|| {
                let full_key = normalize(token);
                self.exact(&full_key)
                    .map(|slot| (slot, MatchStrategy::FullTokenExact))
                    .or_else(|| {
                        self.either_way(&full_key)
                            .map(|slot| (slot, MatchStrategy::FullTokenPartial))
                    })
            });

        match hit {
            Some((slot, strategy)) => {
                let record = self.store.record(slot);
                tracing::debug!(token, city = %record.name_en, strategy = %strategy, "resolved");
                Some(ResolvedCity::new(record, strategy))
            }
            None => {
                tracing::debug!(token, "no match");
                None
            }
        }
    }

    fn exact(&self, key: &str) -> Option<usize> {
        self.store
            .city_entries()
            .iter()
            .find(|e| e.normalized == key)
            .map(|e| e.record)
    }

    fn partial(&self, key: &str) -> Option<usize> {
        self.store
            .city_entries()
            .iter()
            .find(|e| e.normalized.contains(key))
            .map(|e| e.record)
    }

    fn either_way(&self, key: &str) -> Option<usize> {
        self.store
            .city_entries()
            .iter()
            .find(|e| e.normalized.contains(key) || key.contains(e.normalized.as_str()))
            .map(|e| e.record)
    }

    fn alias(&self, key: &str) -> Option<usize> {
        let canonical = self.store.alias(key)?;
        self.store
            .city_entries()
            .iter()
            .find(|e| e.key == canonical)
            .map(|e| e.record)
    }

    /// First city, in admission order, inside the first district whose name
    /// normalizes to `key`.
    fn district_fallback(&self, key: &str) -> Option<usize> {
        let entry = self
            .store
            .district_names()
            .iter()
            .find(|d| d.normalized == key)?;
        let district_id = self.store.district(entry.district).id;

        self.store
            .city_entries()
            .iter()
            .find(|e| self.store.record(e.record).district_id == district_id)
            .map(|e| e.record)
    }
}

impl ReferenceStore {
    /// Shorthand for `LocationResolver::new(self).resolve(token)`.
    pub fn resolve(&self, token: &str) -> Option<ResolvedCity> {
        LocationResolver::new(self).resolve(token)
    }
}
