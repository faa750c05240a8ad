//! Derived map geometry.
//!
//! Everything here is a pure function of marker positions; overlays are
//! rebuilt from the store after each mutation and never cached across one.

use serde::Serialize;

use crate::geo::{bearing_deg, haversine_m, lerp, offset, LatLon};
use crate::model::{Pattern, Waypoint};
use crate::store::WaypointStore;
use crate::zones::ExclusionZoneSet;

/// Arc length between ring vertices of a preview circle.
pub const RING_SPACING_M: f64 = 4.0;
const MIN_RING_VERTICES: usize = 12;
const MAX_RING_VERTICES: usize = 4096;

/// Rectangles needing more sweep lines than this are drawn as a single leg.
pub const MAX_SWEEP_LINES: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRect {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

impl BoundingRect {
    pub fn from_corners(a: LatLon, b: LatLon) -> Self {
        Self {
            south_west: LatLon::new(a.lat.min(b.lat), a.lon.min(b.lon)),
            north_east: LatLon::new(a.lat.max(b.lat), a.lon.max(b.lon)),
        }
    }

    pub fn contains(&self, p: LatLon) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&p.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&p.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub centre: LatLon,
    pub radius_m: f64,
    /// Closed polyline approximation, first vertex repeated at the end.
    pub ring: Vec<LatLon>,
}

impl Circle {
    pub fn through(centre: LatLon, edge: LatLon) -> Self {
        let radius_m = haversine_m(centre, edge);
        Self { centre, radius_m, ring: ring(centre, radius_m, bearing_deg(centre, edge)) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiralPreview {
    pub centre: LatLon,
    /// Zero, one or two circles, smallest radius first.
    pub circles: Vec<Circle>,
}

impl SpiralPreview {
    pub fn inner(&self) -> Option<&Circle> {
        self.circles.first()
    }

    pub fn outer(&self) -> Option<&Circle> {
        self.circles.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Not enough markers to draw anything.
    Empty,
    /// Manual route through waypoints in ordinal order.
    Path { points: Vec<LatLon> },
    Lawnmower { bounds: BoundingRect, sweep: Vec<LatLon> },
    Spiral(SpiralPreview),
    /// One polygon per zone with at least one vertex.
    Exclusion { polygons: Vec<Vec<LatLon>> },
}

/// Overlay for `pattern` computed from the store's current contents.
pub fn derive(pattern: Pattern, store: &WaypointStore, sweep_spacing_m: f64) -> Overlay {
    let points = store.list(pattern);
    match pattern {
        Pattern::Manual => Overlay::Path { points: positions(points) },
        Pattern::Lawnmower => match points {
            [a, b] => Overlay::Lawnmower {
                bounds: BoundingRect::from_corners(a.position(), b.position()),
                sweep: sweep_path(a.position(), b.position(), sweep_spacing_m),
            },
            _ => Overlay::Empty,
        },
        Pattern::Spiral => spiral_preview(points).map_or(Overlay::Empty, Overlay::Spiral),
        Pattern::Exclusion => Overlay::Exclusion { polygons: exclusion_polygons(store.zones()) },
    }
}

fn positions(points: &[Waypoint]) -> Vec<LatLon> {
    points.iter().map(Waypoint::position).collect()
}

/// Boustrophedon coverage of the rectangle spanned by `c1` and `c2`.
///
/// Sweep lines run along the longer side and are stepped `spacing_m` apart
/// along the shorter one, alternating direction so each line starts where
/// the previous one ended. Yields `2*steps + 1` points for an odd number of
/// steps and `2*steps + 2` for an even one; a rectangle narrower than one
/// spacing, or one needing more than [`MAX_SWEEP_LINES`], collapses to
/// `[c1, c2]`.
pub fn sweep_path(c1: LatLon, c2: LatLon, spacing_m: f64) -> Vec<LatLon> {
    let turn = LatLon::new(c1.lat, c2.lon);
    let east_west = haversine_m(c1, turn);
    let north_south = haversine_m(turn, c2);

    let lines = (east_west.min(north_south) / spacing_m).floor();
    // NaN and infinities fall outside the range too.
    if !(1.0..=MAX_SWEEP_LINES as f64).contains(&lines) {
        return vec![c1, c2];
    }
    let steps = lines as usize;

    // Wider than tall: lines run east-west and step in latitude.
    let step_lat = east_west > north_south;
    let mut path = Vec::with_capacity(steps.saturating_mul(2).saturating_add(2));
    for i in 0..steps {
        let at = lerp(c1, c2, i as f64 / steps as f64);
        let (near, far) = if step_lat {
            (LatLon::new(at.lat, c1.lon), LatLon::new(at.lat, c2.lon))
        } else {
            (LatLon::new(c1.lat, at.lon), LatLon::new(c2.lat, at.lon))
        };
        if i % 2 == 0 {
            path.push(near);
            path.push(far);
        } else {
            path.push(far);
            path.push(near);
        }
    }

    // An even count leaves us on c1's side; cross over before the last leg.
    if steps % 2 == 0 {
        path.push(if step_lat {
            LatLon::new(c2.lat, c1.lon)
        } else {
            LatLon::new(c1.lat, c2.lon)
        });
    }
    path.push(c2);
    path
}

/// Preview for a spiral: the first marker is the centre, later markers set
/// the start and end radius.
pub fn spiral_preview(points: &[Waypoint]) -> Option<SpiralPreview> {
    let (centre, edges) = points.split_first()?;
    let centre = centre.position();
    let mut circles: Vec<Circle> = edges
        .iter()
        .take(2)
        .map(|edge| Circle::through(centre, edge.position()))
        .collect();
    circles.sort_by(|a, b| a.radius_m.total_cmp(&b.radius_m));
    Some(SpiralPreview { centre, circles })
}

pub fn exclusion_polygons(zones: &ExclusionZoneSet) -> Vec<Vec<LatLon>> {
    zones
        .zones()
        .iter()
        .filter(|z| !z.is_empty())
        .map(|z| positions(z))
        .collect()
}

/// Starts at `start_bearing` so the ring passes through the edge marker.
fn ring(centre: LatLon, radius_m: f64, start_bearing: f64) -> Vec<LatLon> {
    if radius_m <= 0.0 || !radius_m.is_finite() {
        return vec![centre];
    }
    let circumference = 2.0 * std::f64::consts::PI * radius_m;
    let n = ((circumference / RING_SPACING_M).ceil() as usize).clamp(MIN_RING_VERTICES, MAX_RING_VERTICES);
    let mut pts: Vec<LatLon> = (0..n)
        .map(|i| offset(centre, radius_m, start_bearing + 360.0 * i as f64 / n as f64))
        .collect();
    pts.push(pts[0]);
    pts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_M;
    use approx::assert_relative_eq;

    /// Degrees spanned by `m` metres along a meridian (or the equator).
    fn deg(m: f64) -> f64 {
        (m / EARTH_RADIUS_M).to_degrees()
    }

    fn corners(east_m: f64, north_m: f64) -> (LatLon, LatLon) {
        (LatLon::new(0.0, 0.0), LatLon::new(deg(north_m), deg(east_m)))
    }

    #[test]
    fn odd_steps_emit_two_per_line_plus_corner() {
        // 30 m wide, a little over 9 m tall: floor(9.3 / 3) = 3 lines.
        let (c1, c2) = corners(30.0, 9.3);
        let path = sweep_path(c1, c2, 3.0);
        assert_eq!(path.len(), 2 * 3 + 1);
        assert_eq!(path[0], c1);
        assert_eq!(*path.last().unwrap(), c2);
        // Lines run east-west: each pair shares a latitude.
        for pair in path[..6].chunks(2) {
            assert_eq!(pair[0].lat, pair[1].lat);
        }
        // Serpentine: line 1 starts on the far side.
        assert_eq!(path[2].lon, c2.lon);
        assert_eq!(path[3].lon, c1.lon);
    }

    #[test]
    fn thirty_by_nine_at_three_metres_is_seven_points() {
        let (c1, c2) = corners(30.0, 9.0);
        let path = sweep_path(c1, c2, 3.0);
        assert_eq!(path.len(), 7);
        assert_eq!(path[0], c1);
        assert_eq!(path[6], c2);
    }

    #[test]
    fn even_steps_add_a_crossing_corner() {
        let (c1, c2) = corners(30.0, 12.4);
        let path = sweep_path(c1, c2, 3.0);
        assert_eq!(path.len(), 2 * 4 + 2);
        assert_eq!(path[8], LatLon::new(c2.lat, c1.lon));
        assert_eq!(path[9], c2);
    }

    #[test]
    fn tall_rectangles_step_in_longitude() {
        let (c1, c2) = corners(9.3, 30.0);
        let path = sweep_path(c1, c2, 3.0);
        assert_eq!(path.len(), 7);
        for pair in path[..6].chunks(2) {
            assert_eq!(pair[0].lon, pair[1].lon);
        }
        assert_relative_eq!(path[2].lon - path[0].lon, c2.lon / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn narrow_rectangle_is_a_single_leg() {
        let (c1, c2) = corners(2.0, 2.0);
        assert_eq!(sweep_path(c1, c2, 3.0), vec![c1, c2]);
        assert_eq!(sweep_path(c1, c2, 0.0), vec![c1, c2]);
        assert_eq!(sweep_path(c1, c2, f64::NAN), vec![c1, c2]);
        assert_eq!(sweep_path(c1, c2, -3.0), vec![c1, c2]);
    }

    #[test]
    fn vanishing_spacing_does_not_explode() {
        let c1 = LatLon::new(-31.98, 115.817);
        let c2 = LatLon::new(-31.9795, 115.8178);
        assert_eq!(sweep_path(c1, c2, 1e-300), vec![c1, c2]);

        // 100 km square at 1 mm would need 1e8 lines.
        let far = offset(offset(c1, 100_000.0, 0.0), 100_000.0, 90.0);
        assert_eq!(sweep_path(c1, far, 0.001), vec![c1, far]);
    }

    #[test]
    fn sweep_is_pure() {
        let c1 = LatLon::new(-31.9800, 115.8170);
        let c2 = LatLon::new(-31.9795, 115.8178);
        assert_eq!(sweep_path(c1, c2, 3.0), sweep_path(c1, c2, 3.0));
    }

    #[test]
    fn sweep_stays_inside_bounds_from_any_corner_order() {
        let a = LatLon::new(-31.9800, 115.8170);
        let b = LatLon::new(-31.9795, 115.8178);
        let bounds = BoundingRect::from_corners(a, b);
        for (c1, c2) in [(a, b), (b, a)] {
            let path = sweep_path(c1, c2, 3.0);
            assert!(path.len() > 2);
            assert!(path.iter().all(|p| bounds.contains(*p)));
            assert_eq!(path[0], c1);
        }
    }

    #[test]
    fn spiral_circles_grow_with_markers() {
        let centre = LatLon::new(-31.98, 115.82);
        let mk = |at: LatLon, ord| Waypoint::new(at, 0.0, ord);
        assert!(spiral_preview(&[]).is_none());

        let one = spiral_preview(&[mk(centre, 1)]).unwrap();
        assert!(one.circles.is_empty());

        let outer_edge = offset(centre, 20.0, 90.0);
        let inner_edge = offset(centre, 8.0, 0.0);
        let three = spiral_preview(&[mk(centre, 1), mk(outer_edge, 2), mk(inner_edge, 3)]).unwrap();
        assert_eq!(three.circles.len(), 2);
        assert_relative_eq!(three.inner().unwrap().radius_m, 8.0, epsilon = 1e-6);
        assert_relative_eq!(three.outer().unwrap().radius_m, 20.0, epsilon = 1e-6);

        let ring = &three.outer().unwrap().ring;
        assert_eq!(ring.first(), ring.last());
        for p in ring {
            assert_relative_eq!(haversine_m(centre, *p), 20.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn ring_starts_at_the_edge_marker() {
        let centre = LatLon::new(-31.98, 115.82);
        let edge = offset(centre, 15.0, 137.0);
        let circle = Circle::through(centre, edge);
        assert_relative_eq!(haversine_m(circle.ring[0], edge), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn huge_rings_are_capped() {
        let centre = LatLon::new(0.0, 0.0);
        let circle = Circle::through(centre, offset(centre, 1_000_000.0, 45.0));
        assert_eq!(circle.ring.len(), MAX_RING_VERTICES + 1);
        assert_relative_eq!(haversine_m(centre, circle.ring[100]), 1_000_000.0, max_relative = 1e-9);
    }

    #[test]
    fn lawnmower_overlay_needs_two_corners() {
        let mut store = WaypointStore::new();
        store.add(Pattern::Lawnmower, LatLon::new(0.0, 0.0), 0.0);
        assert_eq!(derive(Pattern::Lawnmower, &store, 3.0), Overlay::Empty);

        store.add(Pattern::Lawnmower, LatLon::new(deg(9.3), deg(30.0)), 0.0);
        match derive(Pattern::Lawnmower, &store, 3.0) {
            Overlay::Lawnmower { bounds, sweep } => {
                assert_eq!(sweep.len(), 7);
                assert_eq!(bounds.south_west, LatLon::new(0.0, 0.0));
            }
            other => panic!("unexpected overlay {other:?}"),
        }
    }

    #[test]
    fn exclusion_overlay_skips_empty_zones_but_keeps_degenerate_ones() {
        let mut store = WaypointStore::new();
        store.add(Pattern::Exclusion, LatLon::new(1.0, 1.0), 0.0);
        store.add_zone();
        store.add_zone();
        store.add(Pattern::Exclusion, LatLon::new(2.0, 2.0), 0.0);
        store.add(Pattern::Exclusion, LatLon::new(2.0, 3.0), 0.0);

        match derive(Pattern::Exclusion, &store, 3.0) {
            Overlay::Exclusion { polygons } => {
                assert_eq!(polygons.len(), 2);
                assert_eq!(polygons[0].len(), 1);
                assert_eq!(polygons[1].len(), 2);
            }
            other => panic!("unexpected overlay {other:?}"),
        }
    }

    #[test]
    fn overlay_serializes_with_kind_tag() {
        let v = serde_json::to_value(Overlay::Empty).unwrap();
        assert_eq!(v, serde_json::json!({ "kind": "empty" }));
    }
}
