//! Bluetooth identifiers for MLX90632 sensor boards.
//!
//! The firmware exposes a single custom service with one notify
//! characteristic carrying the 12-byte sample frame.

use uuid::{Uuid, uuid};

/// Custom primary service advertised by the sensor.
pub const MLX_SERVICE: Uuid = uuid!("4a5197ff-07ce-499e-8d37-d3d457af549a");

/// Notify characteristic carrying sample frames.
pub const SAMPLE_CHARACTERISTIC: Uuid = uuid!("fedcba98-7654-3210-fedc-ba9876543210");

/// Advertised name of the sensor board. Matched exactly.
pub const DEVICE_NAME_FILTER: &str = "MLX R";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid() {
        let expected = "4a5197ff-07ce-499e-8d37-d3d457af549a";
        assert_eq!(MLX_SERVICE.to_string(), expected);
    }

    #[test]
    fn test_sample_characteristic_uuid() {
        let expected = "fedcba98-7654-3210-fedc-ba9876543210";
        assert_eq!(SAMPLE_CHARACTERISTIC.to_string(), expected);
    }

    #[test]
    fn test_uuids_are_distinct() {
        assert_ne!(MLX_SERVICE, SAMPLE_CHARACTERISTIC);
    }

    #[test]
    fn test_device_name_filter() {
        assert_eq!(DEVICE_NAME_FILTER, "MLX R");
    }
}
