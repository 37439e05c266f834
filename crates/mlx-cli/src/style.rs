//! Visual styling utilities for the CLI.
//!
//! Spinners for long-running operations and the colors used for the two
//! temperature series. Ambient is cyan and object is yellow everywhere,
//! including the dashboard chart.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use mlx_types::LinkState;
use owo_colors::OwoColorize;

// ============================================================================
// Progress Indicators
// ============================================================================

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Create a spinner for scanning operations.
pub fn scanning_spinner(timeout: Duration) -> ProgressBar {
    spinner(format!("Scanning for sensors... ({}s)", timeout.as_secs()))
}

/// Create a spinner for connecting to a sensor.
pub fn connecting_spinner(device: &str) -> ProgressBar {
    spinner(format!("Connecting to {}...", device))
}

// ============================================================================
// Colors
// ============================================================================

/// Ambient temperature value.
pub fn ambient(value: &str, no_color: bool) -> String {
    if no_color {
        value.to_string()
    } else {
        value.cyan().to_string()
    }
}

/// Object temperature value.
pub fn object(value: &str, no_color: bool) -> String {
    if no_color {
        value.to_string()
    } else {
        value.yellow().bold().to_string()
    }
}

/// Link state label.
pub fn link_state(state: LinkState, no_color: bool) -> String {
    let label = state.to_string();
    if no_color {
        return label;
    }
    match state {
        LinkState::Disconnected => label.red().to_string(),
        LinkState::Connecting => label.yellow().to_string(),
        LinkState::Connected => label.green().to_string(),
        LinkState::Measuring => label.green().bold().to_string(),
    }
}
