//! CSV rendering of the session log.

use std::fmt::Write as _;

use crate::error::ExportError;
use crate::record::Record;

/// Header line of the exported CSV.
pub const CSV_HEADER: &str =
    "Ambient_C,Object_C,SensorElapsed_ms,SensorElapsed_s,MeasureElapsed_s,RecvEpoch_ms,RecvJST";

/// Default export file name.
pub const EXPORT_FILE_NAME: &str = "mlx90632_data.csv";

/// Render one record as an unquoted CSV line (no trailing newline).
///
/// Floats are written with [`format_csv_number`].
pub fn csv_line(record: &Record) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        format_csv_number(record.ambient_c),
        format_csv_number(record.object_c),
        record.sensor_elapsed_ms,
        format_csv_number(record.sensor_elapsed_s),
        format_csv_number(record.measure_elapsed_s),
        record.recv_epoch_ms,
        record.recv_timestamp,
    )
}

/// Format a float the way browsers print numbers.
///
/// Shortest round-trip digits; `-0` prints as `0`, infinities as
/// `Infinity`, and magnitudes below 1e-6 or from 1e21 up switch to
/// exponent notation (`1e-7`, `1.5e+21`).
pub fn format_csv_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let exponent = format!("{value:e}");
    match exponent.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exponent,
    }
}

/// Render the header plus every record, each line newline-terminated.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] when there is nothing to export.
pub fn render_csv(records: &[Record]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut out = String::with_capacity((records.len() + 1) * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", csv_line(record));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ambient_c: f64, recv_epoch_ms: i64) -> Record {
        Record {
            ambient_c,
            object_c: 36.5,
            sensor_elapsed_ms: 2500,
            sensor_elapsed_s: 2.5,
            measure_elapsed_s: 1.0,
            recv_epoch_ms,
            recv_timestamp: "2024-01-02T03:04:05.678".to_string(),
        }
    }

    #[test]
    fn test_empty_log_is_rejected() {
        assert_eq!(render_csv(&[]), Err(ExportError::Empty));
        assert_eq!(ExportError::Empty.to_string(), "No data to export");
    }

    #[test]
    fn test_csv_layout() {
        let csv = render_csv(&[record(25.5, 1000), record(25.75, 2000)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "25.5,36.5,2500,2.5,1,1000,2024-01-02T03:04:05.678");
        assert_eq!(lines[2], "25.75,36.5,2500,2.5,1,2000,2024-01-02T03:04:05.678");
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_widened_float_digits() {
        let line = csv_line(&record(f64::from(23.1f32), 0));
        assert!(line.starts_with("23.100000381469727,"));
    }

    #[test]
    fn test_number_spelling() {
        assert_eq!(format_csv_number(-0.0), "0");
        assert_eq!(format_csv_number(f64::INFINITY), "Infinity");
        assert_eq!(format_csv_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_csv_number(f64::NAN), "NaN");
        assert_eq!(format_csv_number(1e-7), "1e-7");
        assert_eq!(format_csv_number(-2.5e-9), "-2.5e-9");
        assert_eq!(format_csv_number(0.000001), "0.000001");
        assert_eq!(format_csv_number(1.5e21), "1.5e+21");
        assert_eq!(format_csv_number(1e20), "100000000000000000000");
        assert_eq!(format_csv_number(2.5), "2.5");
        assert_eq!(format_csv_number(1.0), "1");
    }

    #[test]
    fn test_unusual_values_in_line() {
        let mut unusual = record(-0.0, 7);
        unusual.object_c = f64::INFINITY;
        unusual.measure_elapsed_s = 1e-7;
        assert_eq!(
            csv_line(&unusual),
            "0,Infinity,2500,2.5,1e-7,7,2024-01-02T03:04:05.678"
        );
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(EXPORT_FILE_NAME, "mlx90632_data.csv");
    }
}
