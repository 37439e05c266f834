mod cli;
mod commands;
mod format;
mod style;

use std::fs::{self, File};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{RecordOptions, cmd_config, cmd_record, cmd_scan};
use format::FormatOptions;
use mlx_cli::config::{
    Config, resolve_device_name, resolve_export_dir, resolve_scan_timeout,
};
use mlx_cli::util::SensorSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "mlx", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    #[cfg(feature = "tui")]
    let is_tui = matches!(cli.command, Commands::Tui { .. });
    #[cfg(not(feature = "tui"))]
    let is_tui = false;

    if is_tui {
        // The dashboard owns the terminal; logs go to a file instead.
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("mlx-monitor");
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
        let log_path = log_dir.join("mlx-tui.log");
        let log_file = File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    let config = Config::load();
    let opts = FormatOptions::new(cli.no_color || config.no_color);

    match cli.command {
        Commands::Scan {
            timeout,
            all,
            format,
        } => {
            let timeout = resolve_scan_timeout(timeout, &config);
            let name_filter = if all {
                None
            } else {
                Some(resolve_device_name(None, &config))
            };
            cmd_scan(timeout, name_filter, format, cli.quiet, &opts).await?;
        }
        Commands::Record(args) => {
            let source = SensorSource::new(
                resolve_device_name(args.device.device.as_deref(), &config),
                resolve_scan_timeout(args.device.timeout, &config),
                args.device.simulate,
            );
            let options = RecordOptions {
                source,
                export_dir: resolve_export_dir(&config),
                count: args.count,
                duration: args.duration.map(Duration::from_secs),
                format: args.format,
                export: args.export,
                no_export: args.no_export,
                quiet: cli.quiet,
            };
            cmd_record(options, &opts).await?;
        }
        #[cfg(feature = "tui")]
        Commands::Tui { device } => {
            let source = SensorSource::new(
                resolve_device_name(device.device.as_deref(), &config),
                resolve_scan_timeout(device.timeout, &config),
                device.simulate,
            );
            mlx_cli::tui::run(source, resolve_export_dir(&config)).await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &config)?;
        }
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}
