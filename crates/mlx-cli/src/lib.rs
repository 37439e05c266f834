//! Command-line interface for the MLX90632 BLE temperature sensor.
//!
//! The sensor board advertises as `MLX R` and streams ambient and object
//! temperatures. `mlx` finds it, records at 1 Hz and exports the session
//! log as CSV, either from the command line or from a terminal dashboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Scan for nearby sensors |
//! | `record` | Connect, print one record per second, export CSV |
//! | `tui` | Interactive dashboard with a live chart |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings live in `~/.config/mlx-monitor/config.toml` (or the platform
//! equivalent): `device_name`, `scan_timeout`, `export_dir` and `no_color`.
//!
//! # Environment Variables
//!
//! - `MLX_DEVICE`: Sensor name to connect to (overridden by `--device`)
//! - `NO_COLOR`: Disable colored output when set
//!
//! # Examples
//!
//! Record ten seconds from the simulated sensor:
//! ```bash
//! mlx record --simulate --duration 10
//! ```
//!
//! Record 60 samples as CSV to stdout without writing a file:
//! ```bash
//! mlx record --count 60 --format csv --no-export
//! ```

pub mod config;
pub mod util;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export core dependencies for convenience
pub use mlx_core;
pub use mlx_types;
