//! Temperature chart: ambient and object series over measurement time.

use ratatui::prelude::*;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use super::theme::BORDER_TYPE;
use crate::tui::app::App;

/// Padding added above and below the plotted temperature range, °C.
const Y_PADDING: f64 = 0.5;

pub(super) fn draw_chart(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();
    let chart = &app.snapshot.chart;

    let title = Line::from(vec![
        Span::styled(" Temperature ", theme.title_style()),
        Span::styled("ambient ", Style::default().fg(theme.ambient)),
        Span::styled("object ", Style::default().fg(theme.object)),
        Span::styled(
            format!("({}/{}) ", chart.len(), chart.capacity()),
            Style::default().fg(theme.text_muted),
        ),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_inactive_style())
        .title(title);

    let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (chart.x_bounds(), chart.y_bounds()) else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Waiting for data...",
            Style::default().fg(theme.text_muted),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let x_hi = if x_hi > x_lo { x_hi } else { x_lo + 1.0 };
    let (y_lo, y_hi) = (y_lo - Y_PADDING, y_hi + Y_PADDING);

    let ambient = chart.ambient_series();
    let object = chart.object_series();
    let datasets = vec![
        Dataset::default()
            .name("Ambient")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.ambient))
            .data(&ambient),
        Dataset::default()
            .name("Object")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.object))
            .data(&object),
    ];

    let first_label = chart.points().next().map(|p| p.label.clone());
    let last_label = chart.points().last().map(|p| p.label.clone());
    let x_labels: Vec<String> = [first_label, last_label]
        .into_iter()
        .flatten()
        .map(|label| format!("{}s", label))
        .collect();
    let y_labels = vec![
        format!("{:.1}", y_lo),
        format!("{:.1}", (y_lo + y_hi) / 2.0),
        format!("{:.1}", y_hi),
    ];

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_lo, x_hi])
                .labels(x_labels)
                .style(Style::default().fg(theme.text_muted)),
        )
        .y_axis(
            Axis::default()
                .title("°C")
                .bounds([y_lo, y_hi])
                .labels(y_labels)
                .style(Style::default().fg(theme.text_muted)),
        );

    frame.render_widget(widget, area);
}
