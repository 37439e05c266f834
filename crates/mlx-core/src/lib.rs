//! Core BLE library for the MLX90632 temperature sensor.
//!
//! The sensor is an embedded board that advertises as `MLX R` and notifies
//! 12-byte frames (ambient °C, object °C, sensor uptime) on one GATT
//! characteristic. This crate finds it, holds the link, and runs the
//! measurement session on a background task.
//!
//! # Features
//!
//! - **Device discovery**: Scan for sensors by exact advertised name
//! - **Notifications**: Subscribe to the sample characteristic
//! - **Link watching**: Device-side disconnects surface as events
//! - **Session worker**: 1 Hz sampling, chart window, CSV export
//! - **Simulation**: A mock sensor that needs no hardware
//!
//! # Platform Differences
//!
//! - **macOS**: Devices are identified by a CoreBluetooth UUID which is stable
//!   per host but differs between Macs.
//! - **Linux/Windows**: Devices are identified by their Bluetooth MAC address.
//!
//! # Quick Start
//!
//! ```no_run
//! use mlx_core::{BleConnector, Command, ConnectOptions, SessionEvent, SessionWorker};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (command_tx, command_rx) = mpsc::channel(32);
//!     let (event_tx, mut event_rx) = mpsc::channel(128);
//!
//!     let connector = BleConnector::new(ConnectOptions::default());
//!     tokio::spawn(SessionWorker::new(connector, command_rx, event_tx).run());
//!
//!     command_tx.send(Command::Connect).await.unwrap();
//!     command_tx.send(Command::StartMeasurement).await.unwrap();
//!
//!     while let Some(event) = event_rx.recv().await {
//!         if let SessionEvent::RecordAppended { readout, .. } = event {
//!             println!("object {} °C", readout.object);
//!         }
//!     }
//! }
//! ```

pub mod device;
pub mod error;
pub mod events;
pub mod messages;
pub mod mock;
pub mod scan;
pub mod traits;
pub mod util;
pub mod worker;

pub use mlx_types::uuid as uuids;

// Core exports
pub use device::{BleConnector, ConnectOptions, ConnectionConfig, Device};
pub use error::{ConnectionFailureReason, DeviceNotFoundReason, Error, Result};
pub use events::{
    DeviceEvent, DeviceId, DisconnectReason, EventDispatcher, EventReceiver, EventSender,
};
pub use messages::{Command, SessionEvent, SessionSnapshot};
pub use mock::{MockConnector, MockDevice, MockDeviceBuilder, Simulation};
pub use scan::{DiscoveredDevice, ScanOptions, find_sensor, scan_with_options};
pub use traits::{Connector, NotificationHandler, SensorDevice};
pub use util::{create_identifier, format_peripheral_id, name_matches};
pub use worker::{COMMAND_CHANNEL_CAPACITY, EVENT_CHANNEL_CAPACITY, SessionWorker, TICK_PERIOD};

/// Type alias for a shared link.
///
/// Links are handed out as trait objects so the worker can drive real and
/// simulated sensors alike.
pub type SharedDevice = std::sync::Arc<dyn SensorDevice>;

// Re-export from mlx-types
pub use mlx_types::{
    ChartPoint, ChartWindow, Controls, LinkState, Readout, Record, Sample, SampleSlot, Session,
};
