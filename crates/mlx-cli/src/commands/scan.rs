//! Scan command implementation.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use mlx_core::{ScanOptions, scan};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_scan_csv, format_scan_json, format_scan_text};
use crate::style;
use mlx_cli::util::write_stdout;

pub async fn cmd_scan(
    timeout: Duration,
    name_filter: Option<String>,
    format: OutputFormat,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    // Show spinner for text output (unless quiet)
    let spinner = if !quiet && format == OutputFormat::Text && io::stderr().is_terminal() {
        Some(style::scanning_spinner(timeout))
    } else {
        None
    };

    let options = match name_filter {
        Some(name) => ScanOptions::default().duration(timeout).name_filter(name),
        None => ScanOptions::default().duration(timeout).all_devices(),
    };

    let result = scan::scan_with_options(options).await;

    // Clear spinner before output
    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let devices = result.context("Failed to scan for devices")?;

    let content = match format {
        OutputFormat::Json => format_scan_json(&devices, opts)?,
        OutputFormat::Text => format_scan_text(&devices, opts),
        OutputFormat::Csv => format_scan_csv(&devices),
    };

    write_stdout(&content)
}
