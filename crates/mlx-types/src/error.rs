//! Error types for mlx-types.

use thiserror::Error;

/// Errors that can occur when decoding sensor notification payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in mlx-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload did not have the exact length of a sample frame.
    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required payload length.
        expected: usize,
        /// Length that was received.
        actual: usize,
    },
}

/// Result type alias using mlx-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors raised when exporting the session log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// There are no records to export.
    #[error("No data to export")]
    Empty,
}
