//! Sample frames and the latest-sample slot.
//!
//! The sensor notifies a fixed 12-byte frame whenever it has a fresh
//! measurement. Frames arrive at whatever rate the firmware chooses, while
//! recording happens at a fixed cadence, so only the newest decoded frame is
//! kept between ticks.

use std::sync::{Arc, Mutex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Exact length of a sample notification frame.
pub const SAMPLE_FRAME_LEN: usize = 12;

/// A decoded sample frame stamped with its client arrival time.
///
/// Frame layout (all little-endian):
/// - bytes 0-3: ambient temperature, f32 °C
/// - bytes 4-7: object temperature, f32 °C
/// - bytes 8-11: milliseconds since the sensor's own epoch, u32
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Ambient (die) temperature in °C.
    pub ambient_c: f64,
    /// Object temperature in °C.
    pub object_c: f64,
    /// Sensor-side elapsed time in milliseconds.
    pub sensor_elapsed_ms: u32,
    /// Client wall-clock arrival time, epoch milliseconds.
    pub received_at_ms: i64,
}

impl Sample {
    /// Decode a notification frame received at `received_at_ms`.
    ///
    /// The temperatures are widened from `f32` so that later formatting
    /// prints the same digits a double-precision consumer would.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] unless `data` is exactly
    /// [`SAMPLE_FRAME_LEN`] bytes.
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8], received_at_ms: i64) -> Result<Self, ParseError> {
        use bytes::Buf;

        if data.len() != SAMPLE_FRAME_LEN {
            return Err(ParseError::InvalidLength {
                expected: SAMPLE_FRAME_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let ambient = buf.get_f32_le();
        let object = buf.get_f32_le();
        let sensor_elapsed_ms = buf.get_u32_le();

        Ok(Sample {
            ambient_c: f64::from(ambient),
            object_c: f64::from(object),
            sensor_elapsed_ms,
            received_at_ms,
        })
    }
}

/// Encode a sample frame the way the sensor firmware does.
///
/// Used by simulated devices and tests.
pub fn encode_frame(ambient_c: f32, object_c: f32, sensor_elapsed_ms: u32) -> [u8; SAMPLE_FRAME_LEN] {
    use bytes::BufMut;

    let mut frame = [0u8; SAMPLE_FRAME_LEN];
    let mut buf = &mut frame[..];
    buf.put_f32_le(ambient_c);
    buf.put_f32_le(object_c);
    buf.put_u32_le(sensor_elapsed_ms);
    frame
}

/// Single-slot holder for the most recent undelivered sample.
///
/// Writers overwrite unconditionally, the reader takes. Cloning yields
/// another handle to the same slot, so the notification path and the tick
/// path can each own one.
#[derive(Debug, Clone, Default)]
pub struct SampleSlot {
    inner: Arc<Mutex<Option<Sample>>>,
}

impl SampleSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `payload` and store it, replacing any unconsumed sample.
    ///
    /// Frames of the wrong length are dropped and leave the slot untouched.
    /// Returns whether the payload was accepted.
    pub fn offer(&self, payload: &[u8], received_at_ms: i64) -> bool {
        match Sample::from_bytes(payload, received_at_ms) {
            Ok(sample) => {
                self.store(sample);
                true
            }
            Err(_) => false,
        }
    }

    /// Store a decoded sample, replacing any unconsumed one.
    pub fn store(&self, sample: Sample) {
        *self.lock() = Some(sample);
    }

    /// Remove and return the buffered sample.
    pub fn take(&self) -> Option<Sample> {
        self.lock().take()
    }

    /// Return a copy of the buffered sample without consuming it.
    pub fn peek(&self) -> Option<Sample> {
        *self.lock()
    }

    /// Drop any buffered sample.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Sample>> {
        // The guarded value is a plain Copy option; a poisoned lock still
        // holds a valid one.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
