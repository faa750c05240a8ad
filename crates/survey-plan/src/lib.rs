//! Mission pattern planning: marker storage, edit-mode state machine and
//! overlay geometry for manual, lawnmower, spiral and exclusion patterns.

pub mod canvas;
pub mod controller;
pub mod doctor;
pub mod geo;
pub mod model;
pub mod overlay;
pub mod serializer;
pub mod session;
pub mod store;
pub mod zones;

use serde::Deserialize;

pub use controller::{MapEvent, MissionEvent, PatternController};
pub use model::{Pattern, SpiralDirection};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Gap between adjacent lawnmower sweep legs, metres.
    pub sweep_spacing_m: f64,
    /// Altitude given to markers placed by map click.
    pub default_alt_m: f64,
    pub spiral_direction: SpiralDirection,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            sweep_spacing_m: 3.0,
            default_alt_m: 0.0,
            spiral_direction: SpiralDirection::Inward,
        }
    }
}
