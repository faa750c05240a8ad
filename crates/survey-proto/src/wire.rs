use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// `[latitude, longitude, altitude]`, degrees and metres.
pub type WirePoint = [f64; 3];

/// One exclusion polygon as an ordered vertex list.
pub type WireZone = Vec<WirePoint>;

/// Navigation method requested from the vehicle process.
///
/// Travels as its integer code so the remote side can switch on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MissionMode {
    Manual,
    Lawnmower,
    /// Spiral, camera facing the centre.
    SpiralIn,
    /// Spiral, camera facing away from the centre.
    SpiralOut,
}

impl MissionMode {
    pub fn code(self) -> u8 {
        match self {
            MissionMode::Manual => 0,
            MissionMode::Lawnmower => 1,
            MissionMode::SpiralIn => 2,
            MissionMode::SpiralOut => 3,
        }
    }
}

impl From<MissionMode> for u8 {
    fn from(mode: MissionMode) -> u8 {
        mode.code()
    }
}

impl TryFrom<u8> for MissionMode {
    type Error = ProtoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MissionMode::Manual),
            1 => Ok(MissionMode::Lawnmower),
            2 => Ok(MissionMode::SpiralIn),
            3 => Ok(MissionMode::SpiralOut),
            other => Err(ProtoError::InvalidMode(other)),
        }
    }
}

/// Commands accepted by the remote vehicle process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum RpcCommand {
    /// Replace every exclusion zone. An empty list clears them all.
    UpdateExclusions(Vec<WireZone>),
    /// Replace the pending waypoint list.
    UpdateWaypoints(Vec<WirePoint>),
    /// Start flying the pending waypoints with the given method.
    BeginWaypoints(MissionMode),
    /// Drop the pending waypoint list.
    ResetWaypoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}

/// Everything the remote side needs to start a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSubmission {
    pub mode: MissionMode,
    pub waypoints: Vec<WirePoint>,
    pub zones: Vec<WireZone>,
}

impl MissionSubmission {
    /// Command sequence that hands this mission to the vehicle.
    /// Exclusions go first so the route planner sees them when the waypoints land.
    pub fn commands(&self) -> Vec<RpcCommand> {
        vec![
            RpcCommand::UpdateExclusions(self.zones.clone()),
            RpcCommand::UpdateWaypoints(self.waypoints.clone()),
            RpcCommand::BeginWaypoints(self.mode),
        ]
    }
}
