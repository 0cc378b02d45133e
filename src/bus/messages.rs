//! Outbound message payloads and their fixed channel ids.

use serde::{Deserialize, Serialize};

/// Channel carrying the left pedal position.
pub const CHANNEL_PEDAL_LEFT: u32 = 0;
/// Channel carrying the right pedal position.
pub const CHANNEL_PEDAL_RIGHT: u32 = 10;
/// Channel carrying the latched button state.
pub const CHANNEL_SWITCH_STATE: u32 = 99;

/// Normalized pedal position in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedalPosition {
    pub position: f32,
}

/// Index of the most recently pressed button, or -1 for none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    pub state: i32,
}

/// Any payload the bridge publishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusPayload {
    Pedal(PedalPosition),
    Switch(SwitchState),
}

impl From<PedalPosition> for BusPayload {
    fn from(payload: PedalPosition) -> Self {
        Self::Pedal(payload)
    }
}

impl From<SwitchState> for BusPayload {
    fn from(payload: SwitchState) -> Self {
        Self::Switch(payload)
    }
}
