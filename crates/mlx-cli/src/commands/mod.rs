//! Command implementations for the CLI.

mod config;
mod record;
mod scan;

pub use config::cmd_config;
pub use record::{RecordOptions, cmd_record};
pub use scan::cmd_scan;
