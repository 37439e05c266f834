//! Main entry point for the TUI dashboard.
//!
//! Sets up the terminal, spawns a session worker and runs the draw/input
//! loop until the user quits. All session logic stays in the worker; the
//! loop only forwards key presses as commands and applies returned events.

pub mod app;
pub mod input;
pub mod ui;

pub use app::App;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::info;

use crate::util::{SensorSource, WorkerHandle, spawn_worker};

/// Input poll interval; also the redraw cadence when idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Enable raw mode and switch to the alternate screen buffer.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard against `source` until the user quits.
pub async fn run(source: SensorSource, export_dir: PathBuf) -> Result<()> {
    info!(device = source.name(), export_dir = %export_dir.display(), "Starting dashboard");

    let simulated = matches!(source, SensorSource::Simulated { .. });
    let mut handle = spawn_worker(&source, export_dir);
    let mut app = App::new(source.name(), simulated);
    app.push_status_message("Press c to connect".to_string());

    let mut terminal = setup_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app, &mut handle);

    let restored = restore_terminal();
    handle.cancel.cancel();
    handle.shutdown().await;

    result.and(restored)
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    handle: &mut WorkerHandle,
) -> Result<()> {
    while !app.should_quit() {
        app.tick_spinner();
        app.clean_expired_messages();

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.should_quit = true;
            } else {
                let action = input::handle_key(key.code, app.notice.is_some());
                if let Some(cmd) = input::apply_action(app, action) {
                    let _ = handle.commands.try_send(cmd);
                }
            }
        }

        // Non-blocking receive of worker events
        while let Ok(event) = handle.events.try_recv() {
            app.handle_session_event(event);
        }
    }

    Ok(())
}
