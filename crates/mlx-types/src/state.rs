//! Link state and which user actions it allows.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Connection/measurement state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkState {
    /// No device link.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Linked, not measuring.
    Connected,
    /// Linked and recording at the tick cadence.
    Measuring,
}

impl LinkState {
    /// Whether a device link exists.
    pub fn is_linked(self) -> bool {
        matches!(self, Self::Connected | Self::Measuring)
    }

    /// Whether a measurement session is running.
    pub fn is_measuring(self) -> bool {
        self == Self::Measuring
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Measuring => "Measuring",
        };
        f.write_str(s)
    }
}

/// Enabled flags for the four user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Controls {
    pub connect: bool,
    pub disconnect: bool,
    /// Start or stop measurement, depending on state.
    pub toggle_measurement: bool,
    pub export: bool,
}

impl Controls {
    /// Derive the enabled actions from the link state and log contents.
    pub fn for_state(state: LinkState, has_records: bool) -> Self {
        match state {
            LinkState::Disconnected => Self {
                connect: true,
                ..Self::default()
            },
            LinkState::Connecting => Self::default(),
            LinkState::Connected | LinkState::Measuring => Self {
                connect: false,
                disconnect: true,
                toggle_measurement: true,
                export: has_records,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_controls() {
        let c = Controls::for_state(LinkState::Disconnected, true);
        assert!(c.connect);
        assert!(!c.disconnect);
        assert!(!c.toggle_measurement);
        assert!(!c.export);
    }

    #[test]
    fn test_connecting_disables_everything() {
        assert_eq!(
            Controls::for_state(LinkState::Connecting, false),
            Controls::default()
        );
    }

    #[test]
    fn test_linked_controls() {
        for state in [LinkState::Connected, LinkState::Measuring] {
            let c = Controls::for_state(state, false);
            assert!(!c.connect);
            assert!(c.disconnect);
            assert!(c.toggle_measurement);
            assert!(!c.export);
            assert!(Controls::for_state(state, true).export);
        }
    }

    #[test]
    fn test_state_predicates() {
        assert!(LinkState::Measuring.is_linked());
        assert!(LinkState::Measuring.is_measuring());
        assert!(LinkState::Connected.is_linked());
        assert!(!LinkState::Connecting.is_linked());
        assert_eq!(LinkState::default(), LinkState::Disconnected);
        assert_eq!(LinkState::Measuring.to_string(), "Measuring");
    }
}
