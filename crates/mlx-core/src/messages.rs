//! Message types for UI/worker communication.
//!
//! ```text
//! +------------------+     Command      +------------------+
//! |    UI / CLI      | --------------> |  SessionWorker   |
//! |    (ratatui)     |                 |  (tokio runtime) |
//! |                  | <-------------- |                  |
//! +------------------+  SessionEvent   +------------------+
//! ```

use std::path::PathBuf;

use mlx_types::{ChartWindow, Controls, LinkState, Readout, Record};

use crate::events::DisconnectReason;

/// Commands sent from the UI to the session worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Find the sensor and connect.
    Connect,
    /// Drop the link. No-op when already disconnected.
    Disconnect,
    /// Start measuring when connected, stop when measuring.
    ToggleMeasurement,
    /// Start a new measurement session.
    StartMeasurement,
    /// Stop the running session. No-op when not measuring.
    StopMeasurement,
    /// Write the session log as CSV.
    Export {
        /// Destination file; the worker's export directory plus the default
        /// file name when `None`.
        path: Option<PathBuf>,
    },
    /// Tear everything down and exit the worker loop.
    Shutdown,
}

/// Everything a dashboard needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: LinkState,
    pub controls: Controls,
    pub device_name: Option<String>,
    pub device_address: Option<String>,
    pub readout: Readout,
    pub chart: ChartWindow,
    pub record_count: usize,
    pub measure_start_ms: Option<i64>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: LinkState::Disconnected,
            controls: Controls::for_state(LinkState::Disconnected, false),
            device_name: None,
            device_address: None,
            readout: Readout::default(),
            chart: ChartWindow::default(),
            record_count: 0,
            measure_start_ms: None,
        }
    }
}

/// Events sent from the session worker back to the UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Link state changed; UI should update its controls.
    StateChanged(LinkState),
    /// A link was established.
    Connected {
        name: Option<String>,
        address: String,
    },
    /// The link ended, by request or from the device side.
    Disconnected { reason: DisconnectReason },
    /// A measurement session started.
    MeasurementStarted { start_ms: i64 },
    /// The running session stopped.
    MeasurementStopped { record_count: usize },
    /// A tick consumed a sample.
    RecordAppended { record: Record, readout: Readout },
    /// The first record of a session exists; export is possible.
    ExportAvailable,
    /// CSV written.
    Exported { path: PathBuf, record_count: usize },
    /// Something the user must acknowledge.
    Notice(String),
    /// Full dashboard state after any change.
    Snapshot(Box<SessionSnapshot>),
}
