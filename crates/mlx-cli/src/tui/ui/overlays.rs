//! Popups drawn over the dashboard: help and the blocking notice.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::theme::{AppTheme, BORDER_TYPE};
use crate::tui::app::App;

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Draw help overlay with keyboard shortcuts.
pub(super) fn draw_help_overlay(frame: &mut Frame, app: &App) {
    let theme = app.app_theme();
    let help_area = centered(frame.area(), 46, 16);
    frame.render_widget(Clear, help_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let lines = vec![
        heading("--- Session ---"),
        Line::from(""),
        shortcut_line("c", "Connect", &theme),
        shortcut_line("d", "Disconnect", &theme),
        shortcut_line("m/Space", "Start/Stop measurement", &theme),
        shortcut_line("e", "Export CSV", &theme),
        Line::from(""),
        heading("--- Other ---"),
        Line::from(""),
        shortcut_line("?", "Toggle help", &theme),
        shortcut_line("Enter", "Dismiss notice", &theme),
        shortcut_line("q/Ctrl+C", "Quit", &theme),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(theme.text_muted),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_active_style())
        .title(Span::styled(" Keyboard Shortcuts ", theme.title_style()));

    frame.render_widget(Paragraph::new(lines).block(block), help_area);
}

/// Create a shortcut line with key and description.
fn shortcut_line<'a>(key: &str, desc: &str, theme: &AppTheme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>12} ", key), Style::default().fg(theme.warning)),
        Span::styled(desc.to_string(), Style::default().fg(theme.text_secondary)),
    ])
}

/// Draw the blocking notice, if any.
pub(super) fn draw_notice(frame: &mut Frame, app: &App) {
    let Some(message) = &app.notice else {
        return;
    };
    let theme = app.app_theme();

    let area = frame.area();
    let width = (area.width * 3 / 4).min(60);
    let popup_area = centered(area, width, 7);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            message.as_str(),
            Style::default()
                .fg(theme.danger)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(theme.text_muted)),
            Span::styled(
                "Enter",
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to dismiss", Style::default().fg(theme.text_muted)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(Style::default().fg(theme.danger))
        .title(Span::styled(" Notice ", theme.title_style()));

    let popup = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}
