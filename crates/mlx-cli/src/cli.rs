//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Reusable sensor selection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Advertised sensor name to connect to, or use MLX_DEVICE env var
    #[arg(short, long, env = "MLX_DEVICE")]
    pub device: Option<String>,

    /// Scan timeout in seconds while looking for the sensor
    #[arg(short = 'T', long)]
    pub timeout: Option<u64>,

    /// Use a simulated sensor instead of Bluetooth
    #[arg(long)]
    pub simulate: bool,
}

/// Arguments of the `record` command
#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Stop after this many records (0 for unlimited)
    #[arg(short = 'n', long, default_value = "0")]
    pub count: u32,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Export the session log to this CSV file when done
    #[arg(short, long, conflicts_with = "no_export")]
    pub export: Option<PathBuf>,

    /// Do not write the session log when done
    #[arg(long)]
    pub no_export: bool,
}

#[derive(Parser)]
#[command(name = "mlx")]
#[command(author, version, about = "CLI for the MLX90632 BLE temperature sensor", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for nearby sensors
    Scan {
        /// Scan timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// List every BLE device, not only sensors
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Connect, record temperatures at 1 Hz and export the log
    Record(RecordArgs),

    /// Launch interactive terminal dashboard
    #[cfg(feature = "tui")]
    Tui {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}
