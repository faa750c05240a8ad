use survey_proto::wire::{MissionMode, MissionSubmission, WirePoint, WireZone};

use crate::geo::haversine_m;
use crate::model::{Pattern, SpiralDirection, Waypoint};
use crate::store::WaypointStore;

/// Zones with fewer vertices cannot enclose anything and are not sent.
pub const MIN_ZONE_VERTICES: usize = 3;

/// The vehicle refuses spirals tighter than this.
pub const MIN_SPIRAL_RADIUS_M: f64 = 0.5;

pub fn mission_mode(pattern: Pattern, direction: SpiralDirection) -> Option<MissionMode> {
    match (pattern, direction) {
        (Pattern::Manual, _) => Some(MissionMode::Manual),
        (Pattern::Lawnmower, _) => Some(MissionMode::Lawnmower),
        (Pattern::Spiral, SpiralDirection::Inward) => Some(MissionMode::SpiralIn),
        (Pattern::Spiral, SpiralDirection::Outward) => Some(MissionMode::SpiralOut),
        (Pattern::Exclusion, _) => None,
    }
}

/// Read-only projection of the store into wire payloads.
#[derive(Debug, Clone, Copy)]
pub struct MissionSerializer<'a> {
    store: &'a WaypointStore,
    pattern: Pattern,
    direction: SpiralDirection,
}

impl<'a> MissionSerializer<'a> {
    pub fn new(store: &'a WaypointStore, pattern: Pattern, direction: SpiralDirection) -> Self {
        Self { store, pattern, direction }
    }

    /// Active pattern's markers in ordinal order.
    pub fn package_active(&self) -> Vec<WirePoint> {
        self.store.list(self.pattern).iter().map(Waypoint::to_wire).collect()
    }

    pub fn package_zones(&self) -> Vec<WireZone> {
        self.store
            .zones()
            .zones()
            .iter()
            .filter(|z| z.len() >= MIN_ZONE_VERTICES)
            .map(|z| z.iter().map(Waypoint::to_wire).collect())
            .collect()
    }

    /// Full submission, or `None` when the active pattern cannot be flown
    /// with the markers it has.
    pub fn package_mission(&self) -> Option<MissionSubmission> {
        let mode = mission_mode(self.pattern, self.direction)?;
        if !self.flyable() {
            return None;
        }
        Some(MissionSubmission {
            mode,
            waypoints: self.package_active(),
            zones: self.package_zones(),
        })
    }

    fn flyable(&self) -> bool {
        let points = self.store.list(self.pattern);
        match self.pattern {
            Pattern::Manual => !points.is_empty(),
            Pattern::Lawnmower => points.len() == 2,
            Pattern::Spiral => match points.split_first() {
                Some((centre, edges)) if !edges.is_empty() => edges
                    .iter()
                    .all(|e| haversine_m(centre.position(), e.position()) >= MIN_SPIRAL_RADIUS_M),
                _ => false,
            },
            Pattern::Exclusion => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{offset, LatLon};

    fn store_with(pattern: Pattern, pts: &[(f64, f64)]) -> WaypointStore {
        let mut store = WaypointStore::new();
        for &(lat, lon) in pts {
            store.add(pattern, LatLon::new(lat, lon), 0.0);
        }
        store
    }

    #[test]
    fn packages_in_ordinal_order() {
        let store = store_with(Pattern::Manual, &[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0)]);
        let ser = MissionSerializer::new(&store, Pattern::Manual, SpiralDirection::Inward);
        assert_eq!(
            ser.package_active(),
            vec![[10.0, 10.0, 0.0], [10.0, 20.0, 0.0], [20.0, 20.0, 0.0]]
        );
    }

    #[test]
    fn drops_zones_that_cannot_form_a_polygon() {
        let mut store = WaypointStore::new();
        for (lat, lon) in [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)] {
            store.add(Pattern::Exclusion, LatLon::new(lat, lon), 0.0);
        }
        store.add_zone();
        let ser = MissionSerializer::new(&store, Pattern::Manual, SpiralDirection::Inward);
        let zones = ser.package_zones();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].len(), 4);

        store.add(Pattern::Exclusion, LatLon::new(5.0, 5.0), 0.0);
        store.add(Pattern::Exclusion, LatLon::new(5.0, 6.0), 0.0);
        let ser = MissionSerializer::new(&store, Pattern::Manual, SpiralDirection::Inward);
        assert_eq!(ser.package_zones().len(), 1);
    }

    #[test]
    fn packaging_does_not_touch_the_store() {
        let store = store_with(Pattern::Manual, &[(1.0, 2.0)]);
        let before = store.clone();
        let ser = MissionSerializer::new(&store, Pattern::Manual, SpiralDirection::Inward);
        let first = ser.package_mission();
        let second = ser.package_mission();
        assert_eq!(first, second);
        assert_eq!(store, before);
    }

    #[test]
    fn insufficient_geometry_is_not_packaged() {
        let empty = WaypointStore::new();
        for pattern in Pattern::ALL {
            let ser = MissionSerializer::new(&empty, pattern, SpiralDirection::Inward);
            assert!(ser.package_mission().is_none(), "{pattern:?}");
        }

        let one_corner = store_with(Pattern::Lawnmower, &[(0.0, 0.0)]);
        let ser = MissionSerializer::new(&one_corner, Pattern::Lawnmower, SpiralDirection::Inward);
        assert!(ser.package_mission().is_none());

        let centre = LatLon::new(-31.98, 115.82);
        let tight = offset(centre, 0.2, 45.0);
        let tight_spiral = store_with(Pattern::Spiral, &[(centre.lat, centre.lon), (tight.lat, tight.lon)]);
        let ser = MissionSerializer::new(&tight_spiral, Pattern::Spiral, SpiralDirection::Inward);
        assert!(ser.package_mission().is_none());
    }

    #[test]
    fn spiral_direction_selects_mode_code() {
        let centre = LatLon::new(-31.98, 115.82);
        let edge = offset(centre, 15.0, 45.0);
        let store = store_with(Pattern::Spiral, &[(centre.lat, centre.lon), (edge.lat, edge.lon)]);

        let inward = MissionSerializer::new(&store, Pattern::Spiral, SpiralDirection::Inward);
        assert_eq!(inward.package_mission().unwrap().mode, MissionMode::SpiralIn);
        let outward = MissionSerializer::new(&store, Pattern::Spiral, SpiralDirection::Outward);
        let sub = outward.package_mission().unwrap();
        assert_eq!(sub.mode.code(), 3);
        assert_eq!(sub.waypoints.len(), 2);
    }
}
