//! Turns a place-name fragment into markers and a connecting line.
//!
//! Fragment syntax: `&`-separated tokens, optional leading `#`.
//! `start;<name>` is the origin, `end;<name>` the destination, anything
//! else is a waypoint. Drawing itself is left to a [`MapRenderer`].

use crate::location::{Coordinate, LocationResolver, MatchStrategy};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

const START_PREFIX: &str = "start;";
const END_PREFIX: &str = "end;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Start,
    End,
    Waypoint,
}

impl fmt::Display for MarkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Waypoint => "waypoint",
        })
    }
}

/// A parsed fragment. A repeated `start;`/`end;` keeps the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub start: Option<String>,
    pub end: Option<String>,
    pub waypoints: Vec<String>,
}

impl Fragment {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        let mut fragment = Self::default();

        for part in raw.split('&') {
            if let Some(name) = part.strip_prefix(START_PREFIX) {
                fragment.start = Some(name.to_string()).filter(|n| !n.is_empty());
            } else if let Some(name) = part.strip_prefix(END_PREFIX) {
                fragment.end = Some(name.to_string()).filter(|n| !n.is_empty());
            } else if !part.is_empty() {
                fragment.waypoints.push(part.to_string());
            }
        }
        fragment
    }

    /// Tokens in drawing order: start, waypoints, end.
    pub fn tokens(&self) -> impl Iterator<Item = (MarkerRole, &str)> + '_ {
        let start = self.start.as_deref().map(|s| (MarkerRole::Start, s));
        let end = self.end.as_deref().map(|s| (MarkerRole::End, s));
        start
            .into_iter()
            .chain(self.waypoints.iter().map(|w| (MarkerRole::Waypoint, w.as_str())))
            .chain(end)
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.waypoints.is_empty()
    }
}

/// One resolved token, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub role: MarkerRole,
    /// The token as written in the fragment.
    pub place: String,
    pub label: String,
    pub postcode: String,
    pub coordinate: Coordinate,
    /// English name of the matched city.
    pub city: String,
    pub matched_by: MatchStrategy,
}

impl Marker {
    pub fn popup(&self) -> String {
        format!("{}\nPostcode: {}", self.label, self.postcode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    fn around(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        Some(points.iter().fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lon),
            north: b.north.max(p.lat),
            east: b.east.max(p.lon),
        }))
    }
}

/// Everything the renderer needs for one fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotPlan {
    pub markers: Vec<Marker>,
    /// Present once two or more tokens resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<Vec<Coordinate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Tokens that matched nothing; they get no marker.
    pub unresolved: Vec<String>,
}

impl PlotPlan {
    pub fn build(resolver: &LocationResolver<'_>, fragment: &Fragment) -> Self {
        let mut plan = Self::default();

        for (role, token) in fragment.tokens() {
            let Some(hit) = resolver.resolve(token) else {
                tracing::info!(token, role = %role, "unrecognized place name skipped");
                plan.unresolved.push(token.to_string());
                continue;
            };
            let label = match role {
                MarkerRole::Start => format!("Start: {}", token),
                MarkerRole::End => format!("End: {}", token),
                MarkerRole::Waypoint => token.to_string(),
            };
            plan.markers.push(Marker {
                role,
                place: token.to_string(),
                label,
                postcode: hit.postcode_or_na().to_string(),
                coordinate: hit.coordinates,
                city: hit.record.name_en.clone(),
                matched_by: hit.matched_by,
            });
        }

        if plan.markers.len() > 1 {
            let points: Vec<Coordinate> = plan.markers.iter().map(|m| m.coordinate).collect();
            plan.bounds = Bounds::around(&points);
            plan.polyline = Some(points);
        }
        plan
    }

    /// Parse and plan in one step.
    pub fn from_fragment(resolver: &LocationResolver<'_>, raw: &str) -> Self {
        Self::build(resolver, &Fragment::parse(raw))
    }

    /// Drive a renderer: every marker in order, then the line.
    pub fn render<R: MapRenderer>(&self, renderer: &mut R) {
        for m in &self.markers {
            renderer.marker(m);
        }
        if let Some(points) = &self.polyline {
            renderer.polyline(points);
        }
    }
}

/// The drawing surface.
pub trait MapRenderer {
    fn marker(&mut self, marker: &Marker);
    fn polyline(&mut self, points: &[Coordinate]);
}

/// Renders a plan as a GeoJSON `FeatureCollection`.
#[derive(Debug, Default)]
pub struct GeoJsonRenderer {
    features: Vec<Value>,
}

impl GeoJsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_value(self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features,
        })
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn marker(&mut self, marker: &Marker) {
        let at = marker.coordinate;
        self.features.push(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [at.lon, at.lat] },
            "properties": {
                "role": marker.role,
                "label": marker.label,
                "postcode": marker.postcode,
                "popup": marker.popup(),
            },
        }));
    }

    fn polyline(&mut self, points: &[Coordinate]) {
        let coords: Vec<[f64; 2]> = points.iter().map(|p| [p.lon, p.lat]).collect();
        self.features.push(json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": coords },
            "properties": { "role": "route" },
        }));
    }
}

/// Render a plan straight to GeoJSON.
pub fn to_geojson(plan: &PlotPlan) -> Value {
    let mut renderer = GeoJsonRenderer::new();
    plan.render(&mut renderer);
    renderer.into_value()
}
