//! Reference data store: cities and districts, built once then sealed.
//!
//! Iteration order is the order rows were admitted. The resolver's
//! partial-match and district-fallback rules return the first hit in that
//! order, so every table here is array-backed with hash maps used only as
//! indexes into the arrays.

use super::normalize::normalize;
use super::types::{CityRecord, CityRow, DataSource, DistrictRecord, DistrictRow};
use serde::Serialize;
use std::collections::HashMap;

/// Default sub-area keyed for the capital when no plain "Colombo" exists.
const CAPITAL: &str = "Colombo";
const CAPITAL_DEFAULT: &str = "Colombo 1";

/// A city key in the store.
#[derive(Debug, Clone)]
pub(crate) struct CityEntry {
    pub key: String,
    pub normalized: String,
    pub record: usize,
}

/// A district name key in the store.
#[derive(Debug, Clone)]
pub(crate) struct DistrictNameEntry {
    pub normalized: String,
    pub district: usize,
}

/// Ingest counters and provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub cities: usize,
    pub city_keys: usize,
    pub aliases: usize,
    pub districts: usize,
    pub rejected_cities: usize,
    pub rejected_districts: usize,
    pub city_source: DataSource,
    pub district_source: DataSource,
}

/// The mutable phase of the store.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    records: Vec<CityRecord>,
    entries: Vec<CityEntry>,
    by_key: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    districts: Vec<DistrictRecord>,
    district_by_id: HashMap<i64, usize>,
    district_names: Vec<DistrictNameEntry>,
    district_by_name: HashMap<String, usize>,
    rejected_cities: usize,
    rejected_districts: usize,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest_districts<I>(&mut self, rows: I) -> &mut Self
    where
        I: IntoIterator<Item = DistrictRow>,
    {
        for row in rows {
            match DistrictRecord::admit(row) {
                Some(d) => self.insert_district(d),
                None => self.rejected_districts += 1,
            }
        }
        self
    }

    pub fn ingest_cities<I>(&mut self, rows: I) -> &mut Self
    where
        I: IntoIterator<Item = CityRow>,
    {
        for row in rows {
            match CityRecord::admit(row) {
                Some(c) => self.insert_city(c),
                None => self.rejected_cities += 1,
            }
        }
        self
    }

    /// Add already-admitted records (the built-in fallback set).
    pub fn insert_records<I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = CityRecord>,
    {
        for record in records {
            self.insert_city(record);
        }
        self
    }

    /// Cities admitted so far.
    pub fn city_count(&self) -> usize {
        self.records.len()
    }

    fn insert_district(&mut self, district: DistrictRecord) {
        let id = district.id;
        let name_key = district.name_en.to_lowercase();

        // Both keys share one slot; a repeated key points at the newer record.
        let slot = self.districts.len();
        self.districts.push(district);
        self.district_by_id.insert(id, slot);

        match self.district_by_name.get(&name_key) {
            Some(&pos) => self.district_names[pos].district = slot,
            None => {
                self.district_by_name
                    .insert(name_key.clone(), self.district_names.len());
                self.district_names.push(DistrictNameEntry {
                    normalized: normalize(&name_key),
                    district: slot,
                });
            }
        }
    }

    fn insert_city(&mut self, record: CityRecord) {
        let name = record.name_en.clone();
        let sub_alias = record.sub_name_en.as_deref().map(normalize);

        match self.by_key.get(&name) {
            // Same name seen before: replace the record, keep its position.
            Some(&pos) => {
                let slot = self.entries[pos].record;
                self.records[slot] = record;
            }
            None => {
                let slot = self.records.len();
                self.records.push(record);
                self.push_entry(name.clone(), slot);
            }
        }

        self.aliases.entry(normalize(&name)).or_insert_with(|| name.clone());
        if let Some(sub) = sub_alias {
            self.aliases.entry(sub).or_insert(name);
        }
    }

    fn push_entry(&mut self, key: String, slot: usize) {
        self.by_key.insert(key.clone(), self.entries.len());
        self.entries.push(CityEntry {
            normalized: normalize(&key),
            key,
            record: slot,
        });
    }

    /// Finish ingest. Registers the capital's default sub-area and freezes
    /// the tables.
    pub fn seal(mut self, city_source: DataSource, district_source: DataSource) -> ReferenceStore {
        if !self.by_key.contains_key(CAPITAL) {
            if let Some(&pos) = self.by_key.get(CAPITAL_DEFAULT) {
                let slot = self.entries[pos].record;
                self.push_entry(CAPITAL.to_string(), slot);
                self.aliases
                    .insert(normalize(CAPITAL), CAPITAL.to_string());
            }
        }

        let stats = StoreStats {
            cities: self.records.len(),
            city_keys: self.entries.len(),
            aliases: self.aliases.len(),
            districts: self.district_names.len(),
            rejected_cities: self.rejected_cities,
            rejected_districts: self.rejected_districts,
            city_source,
            district_source,
        };

        tracing::info!(
            cities = stats.cities,
            districts = stats.districts,
            rejected_cities = stats.rejected_cities,
            rejected_districts = stats.rejected_districts,
            city_source = %city_source,
            district_source = %district_source,
            "reference store sealed"
        );

        ReferenceStore {
            records: self.records,
            entries: self.entries,
            by_key: self.by_key,
            aliases: self.aliases,
            districts: self.districts,
            district_by_id: self.district_by_id,
            district_names: self.district_names,
            district_by_name: self.district_by_name,
            stats,
        }
    }
}

/// The sealed, read-only store. Safe to share behind an `Arc`.
#[derive(Debug)]
pub struct ReferenceStore {
    records: Vec<CityRecord>,
    entries: Vec<CityEntry>,
    by_key: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    districts: Vec<DistrictRecord>,
    district_by_id: HashMap<i64, usize>,
    district_names: Vec<DistrictNameEntry>,
    district_by_name: HashMap<String, usize>,
    stats: StoreStats,
}

impl ReferenceStore {
    /// Build and seal a store from raw rows in one step.
    pub fn ingest<C, D>(city_rows: C, district_rows: D) -> Self
    where
        C: IntoIterator<Item = CityRow>,
        D: IntoIterator<Item = DistrictRow>,
    {
        let mut builder = StoreBuilder::new();
        builder.ingest_districts(district_rows).ingest_cities(city_rows);
        builder.seal(DataSource::Rows, DataSource::Rows)
    }

    /// City stored under an exact English-name key.
    pub fn city(&self, key: &str) -> Option<&CityRecord> {
        self.by_key
            .get(key)
            .map(|&pos| &self.records[self.entries[pos].record])
    }

    /// All city keys with their records, in admission order.
    pub fn cities(&self) -> impl Iterator<Item = (&str, &CityRecord)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), &self.records[e.record]))
    }

    pub(crate) fn city_entries(&self) -> &[CityEntry] {
        &self.entries
    }

    pub(crate) fn record(&self, slot: usize) -> &CityRecord {
        &self.records[slot]
    }

    /// Canonical English name registered for a normalized key.
    pub fn alias(&self, normalized: &str) -> Option<&str> {
        self.aliases.get(normalized).map(String::as_str)
    }

    pub fn district_by_id(&self, id: i64) -> Option<&DistrictRecord> {
        self.district_by_id.get(&id).map(|&i| &self.districts[i])
    }

    /// District by its lowercase English name.
    pub fn district_by_name(&self, name: &str) -> Option<&DistrictRecord> {
        self.district_by_name
            .get(&name.to_lowercase())
            .map(|&pos| &self.districts[self.district_names[pos].district])
    }

    pub(crate) fn district_names(&self) -> &[DistrictNameEntry] {
        &self.district_names
    }

    pub(crate) fn district(&self, slot: usize) -> &DistrictRecord {
        &self.districts[slot]
    }

    /// Districts in admission order, one per distinct name.
    pub fn districts(&self) -> impl Iterator<Item = &DistrictRecord> + '_ {
        self.district_names.iter().map(|e| &self.districts[e.district])
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(id: i64, district: i64, name: &str, sub: Option<&str>) -> CityRow {
        CityRow {
            id,
            district_id: district,
            name_en: Some(name.to_string()),
            sub_name_en: sub.map(String::from),
            postcode: Some(format!("{}", 10000 + id)),
            latitude: Some(6.0 + id as f64 / 100.0),
            longitude: Some(80.0),
            ..Default::default()
        }
    }

    fn district(id: i64, name: &str) -> DistrictRow {
        DistrictRow {
            id,
            province_id: 1,
            name_en: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_key_and_alias() {
        let store = ReferenceStore::ingest(vec![city(1, 5, "Mount Lavinia", None)], vec![]);
        assert!(store.city("Mount Lavinia").is_some());
        assert_eq!(store.alias("mountlavinia"), Some("Mount Lavinia"));
    }

    #[test]
    fn test_sub_name_aliases_parent() {
        let store = ReferenceStore::ingest(vec![city(1, 5, "Colombo 1", Some("Fort"))], vec![]);
        assert_eq!(store.alias("fort"), Some("Colombo 1"));
        assert!(store.city("Fort").is_none());
    }

    #[test]
    fn test_alias_first_writer_wins() {
        let store = ReferenceStore::ingest(
            vec![city(1, 5, "Colombo 2", None), city(2, 5, "Colombo 3", None)],
            vec![],
        );
        assert_eq!(store.alias("colombo"), Some("Colombo 2"));
    }

    #[test]
    fn test_capital_synthetic_key() {
        let store = ReferenceStore::ingest(vec![city(1, 5, "Colombo 1", None)], vec![]);
        let capital = store.city("Colombo").unwrap();
        assert_eq!(capital.name_en, "Colombo 1");
        assert_eq!(store.alias("colombo"), Some("Colombo"));
        // Registered last in iteration order.
        assert_eq!(store.cities().last().unwrap().0, "Colombo");
    }

    #[test]
    fn test_capital_untouched_when_present() {
        let store = ReferenceStore::ingest(
            vec![city(1, 5, "Colombo 1", None), city(2, 5, "Colombo", None)],
            vec![],
        );
        assert_eq!(store.city("Colombo").unwrap().id, 2);
        assert_eq!(store.stats().city_keys, 2);
    }

    #[test]
    fn test_rejected_rows_counted() {
        let mut bad = city(3, 5, "Nowhere", None);
        bad.latitude = None;
        let store = ReferenceStore::ingest(
            vec![city(1, 5, "Galle", None), bad],
            vec![district(1, "Galle"), DistrictRow { id: 2, ..Default::default() }],
        );
        let stats = store.stats();
        assert_eq!(stats.cities, 1);
        assert_eq!(stats.rejected_cities, 1);
        assert_eq!(stats.districts, 1);
        assert_eq!(stats.rejected_districts, 1);
    }

    #[test]
    fn test_duplicate_name_keeps_position() {
        let store = ReferenceStore::ingest(
            vec![
                city(1, 5, "Galle", None),
                city(2, 5, "Matara", None),
                city(3, 6, "Galle", None),
            ],
            vec![],
        );
        let keys: Vec<&str> = store.cities().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Galle", "Matara"]);
        assert_eq!(store.city("Galle").unwrap().id, 3);
    }

    #[test]
    fn test_district_both_keys() {
        let store = ReferenceStore::ingest(vec![], vec![district(12, "Kandy")]);
        let by_id = store.district_by_id(12).unwrap();
        let by_name = store.district_by_name("KANDY").unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(store.districts().count(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let names = ["Matara", "Akuressa", "Weligama", "Dikwella", "Hakmana"];
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, n)| city(i as i64, 21, n, None))
            .collect::<Vec<_>>();
        let store = ReferenceStore::ingest(rows, vec![]);
        let keys: Vec<&str> = store.cities().map(|(k, _)| k).collect();
        assert_eq!(keys, names);
    }
}
