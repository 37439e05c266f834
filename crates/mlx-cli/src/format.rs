//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use mlx_core::DiscoveredDevice;
use mlx_types::{CSV_HEADER, Readout, Record, csv_line};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    /// Create with compact JSON option.
    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize `value` as one JSON document followed by a newline.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

// ============================================================================
// Records
// ============================================================================

/// One human-readable line per record.
#[must_use]
pub fn format_record_text(readout: &Readout, opts: &FormatOptions) -> String {
    format!(
        "[{}] Ambient {} °C | Object {} °C | +{} s\n",
        readout.received_at,
        style::ambient(&readout.ambient, opts.no_color),
        style::object(&readout.object, opts.no_color),
        readout.elapsed
    )
}

/// One JSON document per record.
pub fn format_record_json(record: &Record, opts: &FormatOptions) -> Result<String> {
    opts.as_json(record)
}

#[must_use]
pub fn format_record_csv_header() -> String {
    format!("{CSV_HEADER}\n")
}

/// A CSV row identical to the exported file's.
#[must_use]
pub fn format_record_csv_line(record: &Record) -> String {
    csv_line(record) + "\n"
}

// ============================================================================
// Scan results
// ============================================================================

pub fn format_scan_json(devices: &[DiscoveredDevice], opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        devices: &'a [DiscoveredDevice],
    }

    opts.as_json(&ScanResult {
        count: devices.len(),
        devices,
    })
}

#[must_use]
pub fn format_scan_text(devices: &[DiscoveredDevice], opts: &FormatOptions) -> String {
    if devices.is_empty() {
        return "No sensors found.\n".to_string();
    }

    let count = if opts.no_color {
        devices.len().to_string()
    } else {
        devices.len().to_string().green().bold().to_string()
    };
    let mut out = format!("Found {} device(s)\n\n", count);

    let name_width = devices
        .iter()
        .map(|d| d.name.as_deref().unwrap_or("Unknown").chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let id_width = devices
        .iter()
        .map(|d| d.identifier.len())
        .max()
        .unwrap_or(0)
        .max(10);

    out.push_str(&format!(
        "  {:<name_width$}  {:<id_width$}  {:>8}  {}\n",
        "Name", "Identifier", "RSSI", "Service"
    ));
    for device in devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        let service = if device.advertises_service { "yes" } else { "-" };
        out.push_str(&format!(
            "  {:<name_width$}  {:<id_width$}  {:>8}  {}\n",
            device.name.as_deref().unwrap_or("Unknown"),
            device.identifier,
            rssi,
            service
        ));
    }
    out
}

#[must_use]
pub fn format_scan_csv(devices: &[DiscoveredDevice]) -> String {
    let mut out = "name,identifier,rssi,advertises_service\n".to_string();
    for device in devices {
        out.push_str(&format!(
            "{},{},{},{}\n",
            device.name.as_deref().unwrap_or(""),
            device.identifier,
            device.rssi.map(|r| r.to_string()).unwrap_or_default(),
            device.advertises_service
        ));
    }
    out
}
