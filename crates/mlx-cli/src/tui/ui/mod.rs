//! Main UI layout and rendering for the TUI dashboard.
//!
//! - **Header**: title, link state and device
//! - **Readout**: latest ambient/object values and the four actions
//! - **Chart**: last 50 points of both series
//! - **Status bar**: hints, status messages and the clock

pub mod theme;

mod chart;
mod overlays;

use chrono::Local;
use mlx_types::LinkState;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::app::App;
use theme::{AppTheme, BORDER_TYPE};

/// Draw the complete TUI interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Length(7), // Readout
            Constraint::Min(6),    // Chart
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app);
    draw_readout(frame, main_layout[1], app);
    chart::draw_chart(frame, main_layout[2], app);
    draw_status_bar(frame, main_layout[3], app);

    if app.show_help {
        overlays::draw_help_overlay(frame, app);
    }

    // Notice goes on top of everything
    overlays::draw_notice(frame, app);
}

pub(crate) fn state_color(state: LinkState, theme: &AppTheme) -> Color {
    match state {
        LinkState::Disconnected => theme.danger,
        LinkState::Connecting => theme.warning,
        LinkState::Connected => theme.success,
        LinkState::Measuring => theme.primary,
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();
    let snapshot = &app.snapshot;

    let mut spans = vec![
        Span::styled(
            " MLX90632 Monitor ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(
            format!(" {} ", snapshot.state),
            Style::default()
                .fg(state_color(snapshot.state, &theme))
                .add_modifier(Modifier::BOLD),
        ),
    ];

    let device = match (&snapshot.device_name, &snapshot.device_address) {
        (Some(name), Some(address)) => format!(" {} [{}] ", name, address),
        (None, Some(address)) => format!(" {} ", address),
        _ => format!(" looking for \"{}\" ", app.source_name),
    };
    spans.push(Span::styled(device, Style::default().fg(theme.text_secondary)));

    if app.simulated {
        spans.push(Span::styled(" SIM ", Style::default().fg(theme.warning)));
    }

    if snapshot.record_count > 0 {
        spans.push(Span::styled(
            format!(" {} rec ", snapshot.record_count),
            Style::default().fg(theme.text_secondary),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(theme.header_style());
    frame.render_widget(header, area);
}

fn draw_readout(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();
    let readout = &app.snapshot.readout;
    let controls = app.snapshot.controls;

    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.text_muted));

    let lines = vec![
        Line::from(vec![
            label("Ambient  "),
            Span::styled(
                format!("{} °C", readout.ambient),
                Style::default().fg(theme.ambient),
            ),
            label("    Object  "),
            Span::styled(
                format!("{} °C", readout.object),
                Style::default()
                    .fg(theme.object)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("Elapsed  "),
            Span::styled(
                format!("{} s", readout.elapsed),
                Style::default().fg(theme.text_primary),
            ),
        ]),
        Line::from(vec![
            label("Received "),
            Span::styled(
                readout.received_at.clone(),
                Style::default().fg(theme.text_primary),
            ),
        ]),
        Line::from(""),
        controls_line(app, &theme, controls),
    ];

    let border_style = if app.snapshot.state.is_measuring() {
        theme.border_active_style()
    } else {
        theme.border_inactive_style()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(border_style)
        .title(Span::styled(" Readout ", theme.title_style()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn controls_line<'a>(app: &App, theme: &AppTheme, controls: mlx_types::Controls) -> Line<'a> {
    let toggle = if app.snapshot.state.is_measuring() {
        "Stop"
    } else {
        "Start"
    };
    let items = [
        ("c", "Connect", controls.connect),
        ("d", "Disconnect", controls.disconnect),
        ("m", toggle, controls.toggle_measurement),
        ("e", "Export", controls.export),
    ];

    let mut spans = Vec::new();
    for (key, desc, enabled) in items {
        spans.push(Span::styled(format!("[{}]", key), theme.key_style(enabled)));
        let desc_style = if enabled {
            Style::default().fg(theme.text_secondary)
        } else {
            Style::default().fg(theme.text_muted)
        };
        spans.push(Span::styled(format!(" {}  ", desc), desc_style));
    }
    Line::from(spans)
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();
    let time_str = Local::now().format("%H:%M:%S").to_string();

    let left_spans = if app.state() == LinkState::Connecting {
        vec![
            Span::styled(
                format!("{} ", app.spinner_char()),
                Style::default().fg(theme.primary),
            ),
            Span::styled(
                format!("Connecting to {}...", app.source_name),
                Style::default().fg(theme.text_secondary),
            ),
        ]
    } else if let Some(msg) = app.current_status_message() {
        vec![Span::styled(
            format!(" {}", msg),
            Style::default().fg(theme.text_secondary),
        )]
    } else {
        let hints = [("?", "help"), ("q", "quit")];
        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", Style::default().fg(theme.text_muted)));
            }
            spans.push(Span::styled(*key, theme.key_style(true)));
            spans.push(Span::styled(
                format!(" {}", desc),
                Style::default().fg(theme.text_muted),
            ));
        }
        spans
    };

    let status_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(left_spans)), status_layout[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(time_str, Style::default().fg(theme.text_muted)))
            .alignment(Alignment::Right),
        status_layout[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlx_core::SessionEvent;
    use mlx_types::{Controls, Readout};
    use ratatui::{Terminal, backend::TestBackend};

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_disconnected_placeholders() {
        let app = App::new("MLX R", false);
        let screen = render(&app);
        assert!(screen.contains("MLX90632 Monitor"));
        assert!(screen.contains("Disconnected"));
        assert!(screen.contains("Ambient"));
        assert!(screen.contains("Waiting for data"));
    }

    #[test]
    fn test_draw_measuring_shows_values() {
        let mut app = App::new("MLX R", true);
        app.snapshot.state = LinkState::Measuring;
        app.snapshot.controls = Controls::for_state(LinkState::Measuring, true);
        app.snapshot.readout = Readout {
            ambient: "24.5000".to_string(),
            object: "31.2500".to_string(),
            elapsed: "2.00".to_string(),
            received_at: "2024/01/01 00:00:02.000".to_string(),
        };
        for i in 1..=3 {
            app.snapshot
                .chart
                .append_point(24.5, 31.0 + i as f64, i as f64);
        }
        let screen = render(&app);
        assert!(screen.contains("Measuring"));
        assert!(screen.contains("24.5000"));
        assert!(screen.contains("31.2500"));
        assert!(screen.contains("Stop"));
        assert!(screen.contains("SIM"));
    }

    #[test]
    fn test_draw_notice_popup() {
        let mut app = App::new("MLX R", false);
        app.handle_session_event(SessionEvent::Notice("No data to export".to_string()));
        let screen = render(&app);
        assert!(screen.contains("No data to export"));
    }

    #[test]
    fn test_draw_help_overlay() {
        let mut app = App::new("MLX R", false);
        app.show_help = true;
        let screen = render(&app);
        assert!(screen.contains("Keyboard Shortcuts"));
    }
}
