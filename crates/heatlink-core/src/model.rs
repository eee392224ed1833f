// ── Heater status model ──

use heatlink_proto::{DEFAULT_TEMP, HeaterState};
use serde::{Deserialize, Serialize};

/// Latest known heater status. Owned by the [`StatusStore`](crate::StatusStore);
/// consumers get copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaterStatus {
    pub state: HeaterState,
    /// Target temperature in °C, always within 8..=36.
    pub target_temp: u8,
    /// Heat-exchanger temperature in °C; 0 until a plausible reading arrives.
    pub body_temp: u16,
    /// Ambient temperature in °C; 0 until a plausible reading arrives.
    pub ambient_temp: u8,
    /// True only while the transport session is live.
    pub connected: bool,
}

impl Default for HeaterStatus {
    fn default() -> Self {
        Self {
            state: HeaterState::Off,
            target_temp: DEFAULT_TEMP,
            body_temp: 0,
            ambient_temp: 0,
            connected: false,
        }
    }
}

impl HeaterStatus {
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Human-readable state, e.g. `running` or `unknown_42`.
    pub fn state_name(&self) -> String {
        self.state.to_string()
    }

    /// Ambient temperature, or `None` before the first reading.
    pub fn current_temperature(&self) -> Option<u8> {
        (self.ambient_temp > 0).then_some(self.ambient_temp)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn state_names() {
        let mut status = HeaterStatus::default();
        assert_eq!(status.state_name(), "off");
        status.state = HeaterState::ShuttingDown;
        assert_eq!(status.state_name(), "shutting_down");
        status.state = HeaterState::Unknown(0x42);
        assert_eq!(status.state_name(), "unknown_42");
        assert!(status.is_on());
    }

    #[test]
    fn current_temperature_waits_for_a_reading() {
        let mut status = HeaterStatus::default();
        assert_eq!(status.current_temperature(), None);
        status.ambient_temp = 19;
        assert_eq!(status.current_temperature(), Some(19));
    }
}
