//! Outlet power states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hardware power state of a single PDU outlet.
///
/// `Unknown` is purely observational (initial state, or hardware that did not
/// answer conclusively). The remaining three are the commands a caller may
/// issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    /// No conclusive observation yet
    #[default]
    Unknown,
    /// Outlet energized
    On,
    /// Outlet de-energized
    Off,
    /// Power-cycle the outlet
    Reboot,
}

static VALID_ACTIONS: [PowerState; 3] = [PowerState::On, PowerState::Off, PowerState::Reboot];

impl PowerState {
    /// Every commandable state, in a stable order.
    pub fn valid_actions() -> &'static [PowerState] {
        &VALID_ACTIONS
    }

    /// `true` for every state a driver may be commanded into.
    pub fn is_valid_action(self) -> bool {
        !matches!(self, PowerState::Unknown)
    }

    /// Upper-case name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            PowerState::Unknown => "UNKNOWN",
            PowerState::On => "ON",
            PowerState::Off => "OFF",
            PowerState::Reboot => "REBOOT",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a [`PowerState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid power state '{0}', expected one of UNKNOWN, ON, OFF, REBOOT")]
pub struct ParsePowerStateError(pub String);

impl FromStr for PowerState {
    type Err = ParsePowerStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNKNOWN" => Ok(PowerState::Unknown),
            "ON" => Ok(PowerState::On),
            "OFF" => Ok(PowerState::Off),
            "REBOOT" => Ok(PowerState::Reboot),
            _ => Err(ParsePowerStateError(s.to_string())),
        }
    }
}
