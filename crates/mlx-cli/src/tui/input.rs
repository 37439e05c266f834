//! Keyboard input handling for the TUI.
//!
//! Keys map to [`Action`]s, which [`apply_action`] turns into worker
//! commands or local state changes.
//!
//! # Key Bindings
//!
//! | Key             | Action                   |
//! |-----------------|--------------------------|
//! | `c`             | Connect                  |
//! | `d`             | Disconnect               |
//! | `m` / `Space`   | Start/stop measurement   |
//! | `e`             | Export CSV               |
//! | `?`             | Toggle help              |
//! | `Esc`           | Close help               |
//! | `q`             | Quit                     |
//! | `Enter` / `Esc` | Dismiss notice           |

use crossterm::event::KeyCode;
use mlx_core::Command;

use super::app::App;

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Find the sensor and connect.
    Connect,
    /// Drop the link.
    Disconnect,
    /// Start or stop measuring.
    ToggleMeasurement,
    /// Write the session log as CSV.
    Export,
    /// Toggle the help overlay.
    ToggleHelp,
    /// Close the help overlay.
    CloseHelp,
    /// Acknowledge the current notice.
    DismissNotice,
    /// No action.
    None,
}

/// Map a key to an action.
///
/// While a notice is shown only the dismiss keys do anything.
pub fn handle_key(key: KeyCode, has_notice: bool) -> Action {
    if has_notice {
        return match key {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Action::DismissNotice,
            _ => Action::None,
        };
    }

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('c') => Action::Connect,
        KeyCode::Char('d') => Action::Disconnect,
        KeyCode::Char('m') | KeyCode::Char(' ') => Action::ToggleMeasurement,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Esc => Action::CloseHelp,
        _ => Action::None,
    }
}

/// Apply an action to the app, returning a command for the worker if any.
///
/// Connect and disconnect follow the enabled controls. Measurement and
/// export are always forwarded so the worker can explain a refusal.
pub fn apply_action(app: &mut App, action: Action) -> Option<Command> {
    let controls = app.snapshot.controls;
    match action {
        Action::Quit => {
            app.should_quit = true;
            None
        }
        Action::Connect => {
            if controls.connect {
                app.push_status_message(format!("Connecting to {}...", app.source_name));
                Some(Command::Connect)
            } else {
                app.push_status_message(format!("Cannot connect while {}", app.state()));
                None
            }
        }
        Action::Disconnect => {
            if controls.disconnect {
                Some(Command::Disconnect)
            } else {
                app.push_status_message("Not connected".to_string());
                None
            }
        }
        Action::ToggleMeasurement => Some(Command::ToggleMeasurement),
        Action::Export => Some(Command::Export { path: None }),
        Action::ToggleHelp => {
            app.toggle_help();
            None
        }
        Action::CloseHelp => {
            app.show_help = false;
            None
        }
        Action::DismissNotice => {
            app.dismiss_notice();
            None
        }
        Action::None => None,
    }
}
