//! Session records and the live readout derived from them.

use chrono::{Local, TimeZone};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Display format for the readout receive time.
pub const DISPLAY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// ISO-style format used in the CSV `RecvJST` column.
pub const CSV_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Placeholder shown in every readout field before the first record.
pub const READOUT_PLACEHOLDER: &str = "-";

/// Format epoch milliseconds in `tz` using a chrono format string.
///
/// Returns an empty string if the timestamp is out of range.
pub fn format_epoch_ms<Tz: TimeZone>(epoch_ms: i64, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_default()
}

/// One row of the session log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Ambient temperature in °C.
    pub ambient_c: f64,
    /// Object temperature in °C.
    pub object_c: f64,
    /// Sensor-side elapsed time in milliseconds.
    pub sensor_elapsed_ms: u32,
    /// Sensor-side elapsed time in seconds.
    pub sensor_elapsed_s: f64,
    /// Seconds between measurement start and the sample's arrival.
    pub measure_elapsed_s: f64,
    /// Client arrival time, epoch milliseconds.
    pub recv_epoch_ms: i64,
    /// Client arrival time as local `YYYY-MM-DDTHH:MM:SS.mmm`.
    pub recv_timestamp: String,
}

impl Record {
    /// Derive a record from a consumed sample using the local time zone.
    ///
    /// `measure_start_ms` is the start of the running session; without one
    /// the measurement-elapsed field is zero.
    pub fn from_sample(sample: &Sample, measure_start_ms: Option<i64>) -> Self {
        Self::from_sample_in(sample, measure_start_ms, &Local)
    }

    /// Derive a record, rendering the timestamp in `tz`.
    pub fn from_sample_in<Tz: TimeZone>(
        sample: &Sample,
        measure_start_ms: Option<i64>,
        tz: &Tz,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let measure_elapsed_s = match measure_start_ms {
            Some(start) => (sample.received_at_ms - start) as f64 / 1000.0,
            None => 0.0,
        };

        Self {
            ambient_c: sample.ambient_c,
            object_c: sample.object_c,
            sensor_elapsed_ms: sample.sensor_elapsed_ms,
            sensor_elapsed_s: f64::from(sample.sensor_elapsed_ms) / 1000.0,
            measure_elapsed_s,
            recv_epoch_ms: sample.received_at_ms,
            recv_timestamp: format_epoch_ms(sample.received_at_ms, tz, CSV_TIME_FORMAT),
        }
    }
}

/// Formatted values for the live numeric readout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Readout {
    /// Ambient temperature, 4 decimals.
    pub ambient: String,
    /// Object temperature, 4 decimals.
    pub object: String,
    /// Measurement-elapsed seconds, 2 decimals.
    pub elapsed: String,
    /// Receive time as local `YYYY/MM/DD HH:MM:SS.mmm`.
    pub received_at: String,
}

impl Default for Readout {
    fn default() -> Self {
        Self {
            ambient: READOUT_PLACEHOLDER.to_string(),
            object: READOUT_PLACEHOLDER.to_string(),
            elapsed: READOUT_PLACEHOLDER.to_string(),
            received_at: READOUT_PLACEHOLDER.to_string(),
        }
    }
}

impl Readout {
    /// Build the readout for a record in the local time zone.
    pub fn from_record(record: &Record) -> Self {
        Self::from_record_in(record, &Local)
    }

    /// Build the readout for a record, rendering the receive time in `tz`.
    pub fn from_record_in<Tz: TimeZone>(record: &Record, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            ambient: format!("{:.4}", record.ambient_c),
            object: format!("{:.4}", record.object_c),
            elapsed: format!("{:.2}", record.measure_elapsed_s),
            received_at: format_epoch_ms(record.recv_epoch_ms, tz, DISPLAY_TIME_FORMAT),
        }
    }

    /// Whether this readout still shows placeholders.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn sample(received_at_ms: i64, sensor_elapsed_ms: u32) -> Sample {
        Sample {
            ambient_c: 25.5,
            object_c: 36.125,
            sensor_elapsed_ms,
            received_at_ms,
        }
    }

    #[test]
    fn test_measure_elapsed_from_session_start() {
        let record = Record::from_sample_in(&sample(2000, 2500), Some(1000), &Utc);
        assert_eq!(record.measure_elapsed_s, 1.0);
        assert_eq!(record.sensor_elapsed_s, 2.5);
        assert_eq!(record.sensor_elapsed_ms, 2500);
        assert_eq!(record.recv_epoch_ms, 2000);
    }

    #[test]
    fn test_measure_elapsed_zero_without_session() {
        let record = Record::from_sample_in(&sample(2000, 2500), None, &Utc);
        assert_eq!(record.measure_elapsed_s, 0.0);
    }

    #[test]
    fn test_csv_timestamp_format() {
        // 2024-01-02T03:04:05.678Z
        let record = Record::from_sample_in(&sample(1_704_164_645_678, 0), None, &Utc);
        assert_eq!(record.recv_timestamp, "2024-01-02T03:04:05.678");
    }

    #[test]
    fn test_csv_timestamp_uses_zone() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let record = Record::from_sample_in(&sample(1_704_164_645_678, 0), None, &jst);
        assert_eq!(record.recv_timestamp, "2024-01-02T12:04:05.678");
    }

    #[test]
    fn test_readout_formatting() {
        let record = Record::from_sample_in(&sample(1_704_164_645_007, 0), Some(1_704_164_643_000), &Utc);
        let readout = Readout::from_record_in(&record, &Utc);
        assert_eq!(readout.ambient, "25.5000");
        assert_eq!(readout.object, "36.1250");
        assert_eq!(readout.elapsed, "2.01");
        assert_eq!(readout.received_at, "2024/01/02 03:04:05.007");
        assert!(!readout.is_placeholder());
    }

    #[test]
    fn test_readout_default_is_placeholder() {
        let readout = Readout::default();
        assert_eq!(readout.ambient, "-");
        assert_eq!(readout.received_at, "-");
        assert!(readout.is_placeholder());
    }
}
