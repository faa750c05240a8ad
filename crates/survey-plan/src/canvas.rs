use serde::Serialize;

use crate::model::{MarkerRef, Pattern, Waypoint};
use crate::overlay::Overlay;

/// Which numbered icon the map should use for a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    Locked,
    /// Draggable and click-to-delete.
    Editable,
}

/// Drawing capability of the map widget.
///
/// The controller pushes full marker lists and overlays; implementations
/// replace whatever they previously drew for that pattern.
pub trait MapCanvas {
    fn show_markers(&mut self, pattern: Pattern, markers: &[(MarkerRef, Waypoint)], style: MarkerStyle);
    fn hide_markers(&mut self, pattern: Pattern);
    fn draw_overlay(&mut self, pattern: Pattern, overlay: &Overlay);
    fn clear_overlay(&mut self, pattern: Pattern);
}

/// Canvas for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCanvas;

impl MapCanvas for NullCanvas {
    fn show_markers(&mut self, _: Pattern, _: &[(MarkerRef, Waypoint)], _: MarkerStyle) {}
    fn hide_markers(&mut self, _: Pattern) {}
    fn draw_overlay(&mut self, _: Pattern, _: &Overlay) {}
    fn clear_overlay(&mut self, _: Pattern) {}
}
