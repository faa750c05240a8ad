use serde::Deserialize;
use survey_proto::wire::{MissionSubmission, RpcCommand, WirePoint, WireZone};
use tracing::{debug, info, warn};

use crate::canvas::{MapCanvas, MarkerStyle};
use crate::geo::LatLon;
use crate::model::{Field, MarkerRef, Pattern, SpiralDirection};
use crate::overlay::{self, Overlay};
use crate::serializer::MissionSerializer;
use crate::session::EditSession;
use crate::store::WaypointStore;
use crate::PlannerConfig;

/// Operator input, as delivered by the map widget and the side panel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    SelectPattern { pattern: Pattern },
    ToggleEdit,
    Lock,
    Click { lat: f64, lon: f64 },
    MarkerClick { marker: MarkerRef },
    MarkerDrag { marker: MarkerRef, lat: f64, lon: f64 },
    FieldEdit { marker: MarkerRef, field: Field, value: f64 },
    AddZone,
    Clear,
    Load { pattern: Pattern, points: Vec<WirePoint> },
    LoadZones { zones: Vec<WireZone> },
    SpiralDirection { direction: SpiralDirection },
    Begin,
}

/// Notifications for listeners downstream of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionEvent {
    /// A pattern's markers were added, moved, edited or removed.
    WaypointsChanged(Pattern),
    /// A pattern's markers were bulk-cleared.
    Cleared(Pattern),
    /// Edit mode was left; carries the geometry as it now stands.
    GeometryCommitted {
        pattern: Pattern,
        waypoints: Vec<WirePoint>,
        zones: Vec<WireZone>,
    },
    /// The operator asked to fly the active pattern.
    Submit(MissionSubmission),
}

impl MissionEvent {
    /// Commands the remote vehicle process should receive for this event.
    pub fn rpc_commands(&self) -> Vec<RpcCommand> {
        match self {
            MissionEvent::Submit(sub) => sub.commands(),
            MissionEvent::Cleared(Pattern::Exclusion) => vec![RpcCommand::UpdateExclusions(Vec::new())],
            MissionEvent::Cleared(_) => vec![RpcCommand::ResetWaypoints],
            MissionEvent::WaypointsChanged(_) | MissionEvent::GeometryCommitted { .. } => Vec::new(),
        }
    }
}

/// The pattern/edit-mode state machine.
///
/// Inputs that are not valid in the current state are ignored. Every
/// accepted mutation recomputes the active overlay from the store before
/// returning and pushes it to the canvas.
pub struct PatternController<C: MapCanvas> {
    cfg: PlannerConfig,
    session: EditSession,
    store: WaypointStore,
    overlay: Overlay,
    canvas: C,
    events: Vec<MissionEvent>,
}

impl<C: MapCanvas> PatternController<C> {
    pub fn new(cfg: PlannerConfig, canvas: C) -> Self {
        let mut ctl = Self {
            cfg,
            session: EditSession::default(),
            store: WaypointStore::new(),
            overlay: Overlay::Empty,
            canvas,
            events: Vec::new(),
        };
        ctl.redraw();
        ctl
    }

    pub fn session(&self) -> EditSession {
        self.session
    }

    pub fn store(&self) -> &WaypointStore {
        &self.store
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn spiral_direction(&self) -> SpiralDirection {
        self.cfg.spiral_direction
    }

    pub fn set_spiral_direction(&mut self, direction: SpiralDirection) {
        self.cfg.spiral_direction = direction;
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<MissionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::SelectPattern { pattern } => self.select_pattern(pattern),
            MapEvent::ToggleEdit => self.toggle_edit(),
            MapEvent::Lock => self.lock(),
            MapEvent::Click { lat, lon } => self.map_click(LatLon::new(lat, lon)),
            MapEvent::MarkerClick { marker } => self.marker_click(marker),
            MapEvent::MarkerDrag { marker, lat, lon } => self.marker_drag(marker, LatLon::new(lat, lon)),
            MapEvent::FieldEdit { marker, field, value } => self.edit_field(marker, field, value),
            MapEvent::AddZone => self.add_zone(),
            MapEvent::Clear => self.clear_active(),
            MapEvent::Load { pattern, points } => self.load(pattern, &points),
            MapEvent::LoadZones { zones } => self.load_zones(&zones),
            MapEvent::SpiralDirection { direction } => self.set_spiral_direction(direction),
            MapEvent::Begin => match self.begin_mission() {
                Some(sub) => {
                    info!("plan: mission ready mode={} waypoints={} zones={}", sub.mode.code(), sub.waypoints.len(), sub.zones.len());
                    self.events.push(MissionEvent::Submit(sub));
                }
                None => warn!("plan: begin ignored ({:?}, editing={}): not enough markers or still editing", self.session.pattern, self.session.editing),
            },
        }
    }

    pub fn select_pattern(&mut self, pattern: Pattern) {
        let next = self.session.select(pattern);
        if next == self.session {
            return;
        }
        let prev = self.session.pattern;
        self.canvas.hide_markers(prev);
        self.canvas.clear_overlay(prev);
        self.session = next;
        info!("plan: pattern {:?} -> {:?}", prev, pattern);
        self.redraw();
    }

    pub fn toggle_edit(&mut self) {
        self.session = self.session.toggle();
        if self.session.editing {
            info!("plan: editing {:?}", self.session.pattern);
            self.redraw();
        } else {
            self.commit();
        }
    }

    /// Leave edit mode if it is on.
    pub fn lock(&mut self) {
        if self.session.editing {
            self.session = self.session.locked();
            self.commit();
        }
    }

    fn commit(&mut self) {
        let pruned = self.store.prune_empty_zones();
        if pruned > 0 {
            debug!("plan: dropped {} empty exclusion zones", pruned);
            self.events.push(MissionEvent::WaypointsChanged(Pattern::Exclusion));
        }
        self.redraw();

        let pattern = self.session.pattern;
        let (waypoints, zones) = {
            let ser = self.serializer();
            (ser.package_active(), ser.package_zones())
        };
        info!("plan: committed {:?} waypoints={} zones={}", pattern, waypoints.len(), zones.len());
        self.events.push(MissionEvent::GeometryCommitted { pattern, waypoints, zones });
    }

    pub fn map_click(&mut self, at: LatLon) {
        if self.session.is_locked() {
            return;
        }
        let pattern = self.session.pattern;
        match self.store.add(pattern, at, self.cfg.default_alt_m) {
            Some(wp) => {
                debug!("plan: {:?} marker {} added at {:.7},{:.7}", pattern, wp.ordinal, wp.lat, wp.lon);
                self.changed(pattern);
            }
            None => debug!("plan: click ignored for {:?}", pattern),
        }
    }

    pub fn marker_click(&mut self, marker: MarkerRef) {
        if !self.editable(marker) {
            return;
        }
        if let Some(wp) = self.store.remove(marker) {
            debug!("plan: {:?} marker {} removed from {:.7},{:.7}", marker.pattern, marker.ordinal, wp.lat, wp.lon);
            self.changed(marker.pattern);
        }
    }

    pub fn marker_drag(&mut self, marker: MarkerRef, to: LatLon) {
        if self.editable(marker) && self.store.move_marker(marker, to) {
            self.changed(marker.pattern);
        }
    }

    pub fn edit_field(&mut self, marker: MarkerRef, field: Field, value: f64) {
        if self.editable(marker) && self.store.set_field(marker, field, value) {
            self.changed(marker.pattern);
        }
    }

    /// Start drawing a new exclusion zone.
    pub fn add_zone(&mut self) {
        if self.session.editing && self.session.pattern == Pattern::Exclusion {
            let zone = self.store.add_zone();
            debug!("plan: exclusion zone {} started", zone);
            self.changed(Pattern::Exclusion);
        }
    }

    pub fn clear_active(&mut self) {
        let pattern = self.session.pattern;
        self.store.clear(pattern);
        info!("plan: {:?} markers cleared", pattern);
        self.changed(pattern);
        self.events.push(MissionEvent::Cleared(pattern));
    }

    pub fn load(&mut self, pattern: Pattern, points: &[WirePoint]) {
        self.store.load(pattern, points);
        self.changed(pattern);
    }

    pub fn load_zones(&mut self, zones: &[WireZone]) {
        self.store.load_zones(zones);
        self.changed(Pattern::Exclusion);
    }

    pub fn serializer(&self) -> MissionSerializer<'_> {
        MissionSerializer::new(&self.store, self.session.pattern, self.cfg.spiral_direction)
    }

    /// Submission for the active pattern, if it may be flown right now.
    pub fn begin_mission(&self) -> Option<MissionSubmission> {
        if self.session.editing {
            return None;
        }
        self.serializer().package_mission()
    }

    fn editable(&self, marker: MarkerRef) -> bool {
        self.session.editing && marker.pattern == self.session.pattern
    }

    fn changed(&mut self, pattern: Pattern) {
        if pattern == self.session.pattern {
            self.redraw();
        }
        self.events.push(MissionEvent::WaypointsChanged(pattern));
    }

    fn redraw(&mut self) {
        let pattern = self.session.pattern;
        self.overlay = overlay::derive(pattern, &self.store, self.cfg.sweep_spacing_m);
        let style = if self.session.editing { MarkerStyle::Editable } else { MarkerStyle::Locked };
        let markers = self.store.markers(pattern);
        self.canvas.show_markers(pattern, &markers, style);
        self.canvas.draw_overlay(pattern, &self.overlay);
    }
}
