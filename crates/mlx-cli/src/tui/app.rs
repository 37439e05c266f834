//! Application state for the TUI.
//!
//! The dashboard keeps no session state of its own. It mirrors the latest
//! [`SessionSnapshot`] published by the worker and layers the purely visual
//! state (notice popup, help overlay, status line) on top.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use mlx_core::{DisconnectReason, SessionEvent, SessionSnapshot};
use mlx_types::LinkState;

use super::ui::theme::AppTheme;

/// Maximum number of queued status messages.
const MAX_STATUS_MESSAGES: usize = 5;

/// Application state.
pub struct App {
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Latest worker state.
    pub snapshot: SessionSnapshot,
    /// Blocking notice; input is limited to dismissing it while set.
    pub notice: Option<String>,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Transient status messages with their creation time.
    pub status_messages: Vec<(String, Instant)>,
    /// How long a status message stays visible.
    pub status_message_timeout: Duration,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
    /// Sensor name the worker looks for.
    pub source_name: String,
    /// Whether the simulated sensor is in use.
    pub simulated: bool,
    /// Destination of the most recent export.
    pub last_export: Option<PathBuf>,
}

impl App {
    pub fn new(source_name: impl Into<String>, simulated: bool) -> Self {
        Self {
            should_quit: false,
            snapshot: SessionSnapshot::default(),
            notice: None,
            show_help: false,
            status_messages: Vec::new(),
            status_message_timeout: Duration::from_secs(5),
            spinner_frame: 0,
            source_name: source_name.into(),
            simulated,
            last_export: None,
        }
    }

    /// Returns whether the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn app_theme(&self) -> AppTheme {
        AppTheme::dark()
    }

    pub fn state(&self) -> LinkState {
        self.snapshot.state
    }

    /// Add a status message to the queue.
    pub fn push_status_message(&mut self, message: String) {
        self.status_messages.push((message, Instant::now()));
        while self.status_messages.len() > MAX_STATUS_MESSAGES {
            self.status_messages.remove(0);
        }
    }

    /// Remove expired status messages.
    pub fn clean_expired_messages(&mut self) {
        let timeout = self.status_message_timeout;
        self.status_messages
            .retain(|(_, created)| created.elapsed() < timeout);
    }

    /// Get the current status message to display.
    pub fn current_status_message(&self) -> Option<&str> {
        self.status_messages.last().map(|(msg, _)| msg.as_str())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Advance the spinner animation frame.
    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    /// Get the current spinner character.
    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_frame]
    }

    /// Apply one worker event.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Snapshot(snapshot) => self.snapshot = *snapshot,
            SessionEvent::StateChanged(state) => self.snapshot.state = state,
            SessionEvent::Connected { name, address } => {
                let label = name.unwrap_or_else(|| self.source_name.clone());
                self.push_status_message(format!("Connected to {} ({})", label, address));
            }
            SessionEvent::Disconnected { reason } => {
                // Link loss also arrives as a notice; only user disconnects go here.
                if reason == DisconnectReason::UserRequested {
                    self.push_status_message("Disconnected".to_string());
                }
            }
            SessionEvent::MeasurementStarted { .. } => {
                self.last_export = None;
                self.push_status_message("Measurement started".to_string());
            }
            SessionEvent::MeasurementStopped { record_count } => {
                self.push_status_message(format!(
                    "Measurement stopped ({} records)",
                    record_count
                ));
            }
            SessionEvent::ExportAvailable => {
                self.push_status_message("Export available (e)".to_string());
            }
            SessionEvent::Exported { path, record_count } => {
                self.push_status_message(format!(
                    "Exported {} records to {}",
                    record_count,
                    path.display()
                ));
                self.last_export = Some(path);
            }
            SessionEvent::Notice(message) => self.notice = Some(message),
            SessionEvent::RecordAppended { .. } => {}
        }
    }
}
