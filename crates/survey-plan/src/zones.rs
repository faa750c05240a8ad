use survey_proto::wire::WireZone;

use crate::geo::LatLon;
use crate::model::{renumber, slot, Waypoint};

/// Operator-drawn no-fly polygons. New vertices always land in the active
/// zone; the set never becomes empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionZoneSet {
    zones: Vec<Vec<Waypoint>>,
    active: usize,
}

impl Default for ExclusionZoneSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionZoneSet {
    pub fn new() -> Self {
        Self { zones: vec![Vec::new()], active: 0 }
    }

    pub fn zones(&self) -> &[Vec<Waypoint>] {
        &self.zones
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_zone(&self) -> &[Waypoint] {
        &self.zones[self.active]
    }

    pub fn vertex_count(&self) -> usize {
        self.zones.iter().map(Vec::len).sum()
    }

    /// Start a new, empty zone and route further vertices into it.
    pub fn add_zone(&mut self) -> usize {
        self.zones.push(Vec::new());
        self.active = self.zones.len() - 1;
        self.active
    }

    pub fn push(&mut self, at: LatLon, alt: f64) -> Waypoint {
        let zone = &mut self.zones[self.active];
        let wp = Waypoint::new(at, alt, zone.len() + 1);
        zone.push(wp);
        wp
    }

    pub fn get(&self, zone: usize, ordinal: usize) -> Option<&Waypoint> {
        let z = self.zones.get(zone)?;
        slot(ordinal, z.len()).map(|i| &z[i])
    }

    pub fn get_mut(&mut self, zone: usize, ordinal: usize) -> Option<&mut Waypoint> {
        let z = self.zones.get_mut(zone)?;
        let i = slot(ordinal, z.len())?;
        Some(&mut z[i])
    }

    pub fn remove(&mut self, zone: usize, ordinal: usize) -> Option<Waypoint> {
        let z = self.zones.get_mut(zone)?;
        let i = slot(ordinal, z.len())?;
        let wp = z.remove(i);
        renumber(z);
        Some(wp)
    }

    /// Drop zones without vertices. Returns how many were removed.
    ///
    /// Afterwards the last zone is active. If nothing survived, one empty
    /// zone is kept and does not count as removed.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.zones.len();
        self.zones.retain(|z| !z.is_empty());
        if self.zones.is_empty() {
            self.zones.push(Vec::new());
        }
        let removed = before - self.zones.len();
        if removed > 0 || self.active >= self.zones.len() {
            self.active = self.zones.len() - 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace every zone. The last loaded zone becomes active.
    pub fn load(&mut self, zones: &[WireZone]) {
        self.zones = zones
            .iter()
            .map(|z| {
                z.iter()
                    .enumerate()
                    .map(|(i, p)| Waypoint::new(LatLon::new(p[0], p[1]), p[2], i + 1))
                    .collect()
            })
            .collect();
        if self.zones.is_empty() {
            self.zones.push(Vec::new());
        }
        self.active = self.zones.len() - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> LatLon {
        LatLon::new(lat, lon)
    }

    #[test]
    fn starts_with_one_empty_active_zone() {
        let set = ExclusionZoneSet::new();
        assert_eq!(set.zones().len(), 1);
        assert_eq!(set.active_index(), 0);
        assert!(set.active_zone().is_empty());
    }

    #[test]
    fn vertices_go_to_the_active_zone() {
        let mut set = ExclusionZoneSet::new();
        set.push(p(1.0, 1.0), 0.0);
        set.add_zone();
        set.push(p(2.0, 2.0), 0.0);
        set.push(p(2.0, 3.0), 0.0);
        assert_eq!(set.zones()[0].len(), 1);
        assert_eq!(set.zones()[1].len(), 2);
        assert_eq!(set.active_zone()[1].ordinal, 2);
    }

    #[test]
    fn prune_keeps_non_empty_and_activates_last() {
        let mut set = ExclusionZoneSet::new();
        set.push(p(1.0, 1.0), 0.0);
        set.add_zone();
        set.add_zone();
        set.push(p(3.0, 3.0), 0.0);

        assert_eq!(set.prune_empty(), 1);
        assert_eq!(set.zones().len(), 2);
        assert_eq!(set.active_index(), 1);
        assert_eq!(set.active_zone()[0].lat, 3.0);
    }

    #[test]
    fn prune_of_all_empty_leaves_one_zone() {
        let mut set = ExclusionZoneSet::new();
        set.add_zone();
        set.add_zone();
        assert_eq!(set.prune_empty(), 2);
        assert_eq!(set.zones().len(), 1);
        assert_eq!(set.active_index(), 0);
    }

    #[test]
    fn remove_renumbers_within_zone() {
        let mut set = ExclusionZoneSet::new();
        for i in 0..4 {
            set.push(p(i as f64, 0.0), 0.0);
        }
        let gone = set.remove(0, 2).unwrap();
        assert_eq!(gone.lat, 1.0);
        let ordinals: Vec<_> = set.active_zone().iter().map(|w| w.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert!(set.remove(5, 1).is_none());
        assert!(set.remove(0, 9).is_none());
    }

    #[test]
    fn load_replaces_everything() {
        let mut set = ExclusionZoneSet::new();
        set.push(p(9.0, 9.0), 0.0);
        set.load(&[vec![[1.0, 1.0, 0.0], [1.0, 2.0, 0.0]], vec![[5.0, 5.0, 2.0]]]);
        assert_eq!(set.zones().len(), 2);
        assert_eq!(set.active_index(), 1);
        assert_eq!(set.get(1, 1).unwrap().alt, 2.0);

        set.load(&[]);
        assert_eq!(set, ExclusionZoneSet::new());
    }
}
