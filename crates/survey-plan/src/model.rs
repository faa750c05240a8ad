use serde::{Deserialize, Serialize};
use survey_proto::wire::WirePoint;

use crate::geo::LatLon;

/// Mission shape being edited. Each pattern keeps its own markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Manual,
    Lawnmower,
    Spiral,
    Exclusion,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [
        Pattern::Manual,
        Pattern::Lawnmower,
        Pattern::Spiral,
        Pattern::Exclusion,
    ];

    /// Maximum number of markers the pattern accepts; `None` is unbounded.
    pub fn cap(self) -> Option<usize> {
        match self {
            Pattern::Lawnmower => Some(2),
            Pattern::Spiral => Some(3),
            Pattern::Manual | Pattern::Exclusion => None,
        }
    }

    pub fn accepts(self, current_len: usize) -> bool {
        self.cap().map_or(true, |cap| current_len < cap)
    }
}

/// Which way the camera faces while flying a spiral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiralDirection {
    #[default]
    Inward,
    Outward,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    /// 1-based position inside the owning collection.
    pub ordinal: usize,
}

impl Waypoint {
    pub fn new(at: LatLon, alt: f64, ordinal: usize) -> Self {
        Self { lat: at.lat, lon: at.lon, alt, ordinal }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    pub fn to_wire(&self) -> WirePoint {
        [self.lat, self.lon, self.alt]
    }
}

/// Address of a single marker. `zone` is only read for exclusion markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerRef {
    pub pattern: Pattern,
    #[serde(default)]
    pub zone: usize,
    pub ordinal: usize,
}

impl MarkerRef {
    pub fn new(pattern: Pattern, ordinal: usize) -> Self {
        Self { pattern, zone: 0, ordinal }
    }

    pub fn zone_vertex(zone: usize, ordinal: usize) -> Self {
        Self { pattern: Pattern::Exclusion, zone, ordinal }
    }
}

/// Column of the waypoint table editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Lat,
    Lon,
    Alt,
}

/// Keep ordinals equal to list position, starting at 1.
pub(crate) fn renumber(points: &mut [Waypoint]) {
    for (i, wp) in points.iter_mut().enumerate() {
        wp.ordinal = i + 1;
    }
}

/// Index into a collection for a 1-based ordinal.
pub(crate) fn slot(ordinal: usize, len: usize) -> Option<usize> {
    (ordinal >= 1 && ordinal <= len).then(|| ordinal - 1)
}
