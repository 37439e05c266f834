//! Platform-agnostic types for MLX90632 BLE temperature sensors.
//!
//! This crate provides the sample/record/session logic shared by the
//! native client (mlx-core) and the WebAssembly bindings (mlx-wasm).
//!
//! # Features
//!
//! - Decoding of the 12-byte sample notification frame
//! - A single-slot latest-sample buffer
//! - Session log, readout, sliding chart window
//! - CSV export
//! - BLE identifiers
//!
//! # Example
//!
//! ```
//! use mlx_types::{SampleSlot, Session, encode_frame};
//!
//! let slot = SampleSlot::new();
//! let mut session = Session::new();
//! session.begin(1_000);
//!
//! slot.offer(&encode_frame(24.5, 36.0, 2_500), 2_000);
//! let outcome = session.process(slot.take()).unwrap();
//! assert_eq!(outcome.record.measure_elapsed_s, 1.0);
//! ```

pub mod chart;
pub mod error;
pub mod export;
pub mod record;
pub mod sample;
pub mod session;
pub mod state;
pub mod uuid;

pub use chart::{CHART_CAPACITY, ChartPoint, ChartWindow};
pub use error::{ExportError, ParseError, ParseResult};
pub use export::{CSV_HEADER, EXPORT_FILE_NAME, csv_line, format_csv_number, render_csv};
pub use record::{Readout, Record, format_epoch_ms};
pub use sample::{SAMPLE_FRAME_LEN, Sample, SampleSlot, encode_frame};
pub use session::{Session, TickOutcome};
pub use state::{Controls, LinkState};
pub use uuid as uuids;

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
