//! Error types for mlx-core.
//!
//! This module defines all error types that can occur when talking to an
//! MLX90632 sensor board over Bluetooth Low Energy.
//!
//! # Error classes
//!
//! | Error Type | Class | Handling |
//! |------------|-------|----------|
//! | [`Error::Bluetooth`] | Transport | Notice, back to disconnected |
//! | [`Error::DeviceNotFound`] | Transport | Notice, back to disconnected |
//! | [`Error::ConnectionFailed`] | Transport | Notice, back to disconnected |
//! | [`Error::ServiceNotFound`] | Transport | Notice, back to disconnected |
//! | [`Error::CharacteristicNotFound`] | Transport | Notice, back to disconnected |
//! | [`Error::Timeout`] | Transport | Notice, back to disconnected |
//! | [`Error::NotConnected`] | User | Notice, no state change |
//! | [`Error::InvalidConfig`] | Setup | Fix configuration and restart |
//!
//! No error is retried automatically.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when communicating with a sensor.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Operation attempted while not connected to device.
    #[error("Not connected to device")]
    NotConnected,

    /// The sensor service is missing from the connected device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID that was not found.
        uuid: String,
    },

    /// Required BLE characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Connection failed with specific reason.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// The device identifier that failed to connect.
        device_id: Option<String>,
        /// The structured reason for the failure.
        reason: ConnectionFailureReason,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Structured reasons for connection failures.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionFailureReason {
    /// Generic BLE error.
    BleError(String),
}

impl std::fmt::Display for ConnectionFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BleError(msg) => write!(f, "BLE error: {}", msg),
        }
    }
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No device with the requested name advertised during the scan window.
    NotFound { name: String },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "no device named '{}' in range", name),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific name.
    pub fn device_not_found(name: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound { name: name.into() })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a service not found error.
    pub fn service_not_found(uuid: impl Into<String>) -> Self {
        Self::ServiceNotFound { uuid: uuid.into() }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a connection failure with structured reason.
    pub fn connection_failed(device_id: Option<String>, reason: ConnectionFailureReason) -> Self {
        Self::ConnectionFailed { device_id, reason }
    }
}

/// Result type alias using mlx-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::device_not_found("MLX R");
        assert!(err.to_string().contains("MLX R"));

        let err = Error::NotConnected;
        assert_eq!(err.to_string(), "Not connected to device");

        let err = Error::characteristic_not_found("fedcba98", 3);
        assert!(err.to_string().contains("fedcba98"));
        assert!(err.to_string().contains("3 services"));

        let err = Error::service_not_found("4a5197ff");
        assert_eq!(err.to_string(), "Service not found: 4a5197ff");

        let err = Error::timeout("connect to device", Duration::from_secs(15));
        assert!(err.to_string().contains("connect to device"));
        assert!(err.to_string().contains("15s"));
    }

    #[test]
    fn test_connection_failure_display() {
        let err = Error::connection_failed(
            Some("AA:BB".into()),
            ConnectionFailureReason::BleError("refused".into()),
        );
        assert_eq!(err.to_string(), "Connection failed: BLE error: refused");
    }

    #[test]
    fn test_not_found_reasons() {
        let err = Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter);
        assert!(err.to_string().contains("no Bluetooth adapter"));

        let err = Error::device_not_found("Bench R");
        assert_eq!(
            err.to_string(),
            "Device not found: no device named 'Bench R' in range"
        );
    }
}
