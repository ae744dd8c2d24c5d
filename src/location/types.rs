//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a reference table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    Cache,
    Fallback,
    /// Nothing loaded; the table is empty.
    Unavailable,
    /// Built directly from caller-supplied rows.
    Rows,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "Remote"),
            Self::Cache => write!(f, "Cache"),
            Self::Fallback => write!(f, "Built-in"),
            Self::Unavailable => write!(f, "Unavailable"),
            Self::Rows => write!(f, "Rows"),
        }
    }
}

/// A city row as it arrives from the data source, before admission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRow {
    pub id: i64,
    pub district_id: i64,
    pub name_en: Option<String>,
    pub name_si: Option<String>,
    pub name_ta: Option<String>,
    pub sub_name_en: Option<String>,
    pub sub_name_si: Option<String>,
    pub sub_name_ta: Option<String>,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A district row as it arrives from the data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictRow {
    pub id: i64,
    pub province_id: i64,
    pub name_en: Option<String>,
    pub name_si: Option<String>,
    pub name_ta: Option<String>,
}

/// An admitted city: English name and both coordinates are guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i64,
    pub district_id: i64,
    pub name_en: String,
    #[serde(default)]
    pub name_si: Option<String>,
    #[serde(default)]
    pub name_ta: Option<String>,
    #[serde(default)]
    pub sub_name_en: Option<String>,
    #[serde(default)]
    pub sub_name_si: Option<String>,
    #[serde(default)]
    pub sub_name_ta: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl CityRecord {
    /// Admit a raw row. Returns `None` unless name and both coordinates are present.
    pub fn admit(row: CityRow) -> Option<Self> {
        let name_en = row.name_en.filter(|n| !n.is_empty())?;
        let latitude = row.latitude.filter(|v| v.is_finite())?;
        let longitude = row.longitude.filter(|v| v.is_finite())?;
        Some(Self {
            id: row.id,
            district_id: row.district_id,
            name_en,
            name_si: row.name_si,
            name_ta: row.name_ta,
            sub_name_en: row.sub_name_en,
            sub_name_si: row.sub_name_si,
            sub_name_ta: row.sub_name_ta,
            postcode: row.postcode,
            latitude,
            longitude,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

/// An admitted district: English name is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub id: i64,
    pub province_id: i64,
    pub name_en: String,
    #[serde(default)]
    pub name_si: Option<String>,
    #[serde(default)]
    pub name_ta: Option<String>,
}

impl DistrictRecord {
    pub fn admit(row: DistrictRow) -> Option<Self> {
        let name_en = row.name_en.filter(|n| !n.is_empty())?;
        Some(Self {
            id: row.id,
            province_id: row.province_id,
            name_en,
            name_si: row.name_si,
            name_ta: row.name_ta,
        })
    }
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.4}°{} {:.4}°{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// Which rule of the resolver chain produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactCity,
    PartialCity,
    Alias,
    DistrictFallback,
    FullTokenExact,
    FullTokenPartial,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExactCity => "exact city",
            Self::PartialCity => "partial city",
            Self::Alias => "alias",
            Self::DistrictFallback => "district fallback",
            Self::FullTokenExact => "full token exact",
            Self::FullTokenPartial => "full token partial",
        };
        f.write_str(s)
    }
}

/// The unit returned by resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCity {
    pub coordinates: Coordinate,
    pub record: CityRecord,
    pub matched_by: MatchStrategy,
}

impl ResolvedCity {
    pub fn new(record: &CityRecord, matched_by: MatchStrategy) -> Self {
        Self {
            coordinates: record.coordinate(),
            record: record.clone(),
            matched_by,
        }
    }

    /// Postcode for display, `N/A` when the record has none.
    pub fn postcode_or_na(&self) -> &str {
        self.record.postcode.as_deref().unwrap_or("N/A")
    }
}

/// Reference data loading errors.
///
/// None of these reach the resolver: the loader logs them and degrades.
#[derive(Debug)]
pub enum LocationError {
    Network(String),
    InvalidResponse(String),
    Cache(String),
    /// A dump was fetched but yielded no usable rows.
    NoData(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::Cache(msg) => write!(f, "Cache error: {}", msg),
            Self::NoData(what) => write!(f, "No usable rows in {}", what),
        }
    }
}

impl std::error::Error for LocationError {}
