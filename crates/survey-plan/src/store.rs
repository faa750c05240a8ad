use survey_proto::wire::{WirePoint, WireZone};

use crate::geo::LatLon;
use crate::model::{renumber, slot, Field, MarkerRef, Pattern, Waypoint};
use crate::zones::ExclusionZoneSet;

/// Sole owner of every marker, one collection per pattern.
///
/// All mutators are total: out-of-range markers, capacity overflow and
/// non-finite coordinates turn into no-ops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointStore {
    manual: Vec<Waypoint>,
    lawnmower: Vec<Waypoint>,
    spiral: Vec<Waypoint>,
    exclusion: ExclusionZoneSet,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, pattern: Pattern) -> Option<&Vec<Waypoint>> {
        match pattern {
            Pattern::Manual => Some(&self.manual),
            Pattern::Lawnmower => Some(&self.lawnmower),
            Pattern::Spiral => Some(&self.spiral),
            Pattern::Exclusion => None,
        }
    }

    fn collection_mut(&mut self, pattern: Pattern) -> Option<&mut Vec<Waypoint>> {
        match pattern {
            Pattern::Manual => Some(&mut self.manual),
            Pattern::Lawnmower => Some(&mut self.lawnmower),
            Pattern::Spiral => Some(&mut self.spiral),
            Pattern::Exclusion => None,
        }
    }

    /// Append a marker. Exclusion vertices go to the active zone.
    pub fn add(&mut self, pattern: Pattern, at: LatLon, alt: f64) -> Option<Waypoint> {
        if !at.is_valid() || !alt.is_finite() {
            return None;
        }
        match self.collection_mut(pattern) {
            Some(points) => {
                if !pattern.accepts(points.len()) {
                    return None;
                }
                let wp = Waypoint::new(at, alt, points.len() + 1);
                points.push(wp);
                Some(wp)
            }
            None => Some(self.exclusion.push(at, alt)),
        }
    }

    pub fn remove(&mut self, marker: MarkerRef) -> Option<Waypoint> {
        match self.collection_mut(marker.pattern) {
            Some(points) => {
                let i = slot(marker.ordinal, points.len())?;
                let wp = points.remove(i);
                renumber(points);
                Some(wp)
            }
            None => self.exclusion.remove(marker.zone, marker.ordinal),
        }
    }

    pub fn get(&self, marker: MarkerRef) -> Option<&Waypoint> {
        match self.collection(marker.pattern) {
            Some(points) => slot(marker.ordinal, points.len()).map(|i| &points[i]),
            None => self.exclusion.get(marker.zone, marker.ordinal),
        }
    }

    fn get_mut(&mut self, marker: MarkerRef) -> Option<&mut Waypoint> {
        if marker.pattern == Pattern::Exclusion {
            return self.exclusion.get_mut(marker.zone, marker.ordinal);
        }
        let points = self.collection_mut(marker.pattern)?;
        let i = slot(marker.ordinal, points.len())?;
        Some(&mut points[i])
    }

    /// Reposition a marker, keeping its altitude. Returns whether it moved.
    pub fn move_marker(&mut self, marker: MarkerRef, to: LatLon) -> bool {
        if !to.is_valid() {
            return false;
        }
        match self.get_mut(marker) {
            Some(wp) => {
                wp.lat = to.lat;
                wp.lon = to.lon;
                true
            }
            None => false,
        }
    }

    /// Numeric edit of a single coordinate from the waypoint table.
    pub fn set_field(&mut self, marker: MarkerRef, field: Field, value: f64) -> bool {
        let Some(wp) = self.get_mut(marker) else { return false };
        let mut next = *wp;
        match field {
            Field::Lat => next.lat = value,
            Field::Lon => next.lon = value,
            Field::Alt => next.alt = value,
        }
        if !next.position().is_valid() || !next.alt.is_finite() {
            return false;
        }
        *wp = next;
        true
    }

    /// Markers of `pattern` in ordinal order. For exclusion this is the
    /// active zone; use [`WaypointStore::zones`] for the whole set.
    pub fn list(&self, pattern: Pattern) -> &[Waypoint] {
        match self.collection(pattern) {
            Some(points) => points,
            None => self.exclusion.active_zone(),
        }
    }

    /// Every marker that belongs to `pattern`, with its address.
    pub fn markers(&self, pattern: Pattern) -> Vec<(MarkerRef, Waypoint)> {
        match self.collection(pattern) {
            Some(points) => points
                .iter()
                .map(|wp| (MarkerRef::new(pattern, wp.ordinal), *wp))
                .collect(),
            None => self
                .exclusion
                .zones()
                .iter()
                .enumerate()
                .flat_map(|(z, zone)| {
                    zone.iter().map(move |wp| (MarkerRef::zone_vertex(z, wp.ordinal), *wp))
                })
                .collect(),
        }
    }

    pub fn len(&self, pattern: Pattern) -> usize {
        match self.collection(pattern) {
            Some(points) => points.len(),
            None => self.exclusion.vertex_count(),
        }
    }

    pub fn is_empty(&self, pattern: Pattern) -> bool {
        self.len(pattern) == 0
    }

    pub fn clear(&mut self, pattern: Pattern) {
        match self.collection_mut(pattern) {
            Some(points) => points.clear(),
            None => self.exclusion.clear(),
        }
    }

    /// Replace a pattern's collection with existing coordinates, dropping
    /// entries past the pattern's cap and any invalid entry. Exclusion loads
    /// the points as a single zone.
    pub fn load(&mut self, pattern: Pattern, points: &[WirePoint]) {
        if pattern == Pattern::Exclusion {
            self.load_zones(&[points.to_vec()]);
            return;
        }
        self.clear(pattern);
        for p in points {
            self.add(pattern, LatLon::new(p[0], p[1]), p[2]);
        }
    }

    pub fn load_zones(&mut self, zones: &[WireZone]) {
        let valid: Vec<WireZone> = zones
            .iter()
            .map(|z| {
                z.iter()
                    .copied()
                    .filter(|p| LatLon::new(p[0], p[1]).is_valid() && p[2].is_finite())
                    .collect()
            })
            .collect();
        self.exclusion.load(&valid);
    }

    pub fn zones(&self) -> &ExclusionZoneSet {
        &self.exclusion
    }

    pub fn add_zone(&mut self) -> usize {
        self.exclusion.add_zone()
    }

    pub fn prune_empty_zones(&mut self) -> usize {
        self.exclusion.prune_empty()
    }
}
