//! Color palette and shared styles for the dashboard.
//!
//! Colors follow the Tailwind CSS palette. The two temperature series keep
//! the same hues as the CLI output: ambient cyan, object amber.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

/// Application theme with all UI colors.
#[derive(Debug, Clone, Copy)]
pub struct AppTheme {
    pub primary: Color,

    // Series
    pub ambient: Color,
    pub object: Color,

    // Status colors
    pub success: Color,
    pub warning: Color,
    pub danger: Color,

    // Text colors
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    // Border colors
    pub border_active: Color,
    pub border_inactive: Color,

    pub bg_header: Color,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl AppTheme {
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            primary: Color::Rgb(34, 211, 238), // cyan-400

            ambient: Color::Rgb(34, 211, 238), // cyan-400
            object: Color::Rgb(251, 191, 36),  // amber-400

            success: Color::Rgb(74, 222, 128), // green-400
            warning: Color::Rgb(251, 191, 36), // amber-400
            danger: Color::Rgb(248, 113, 113), // red-400

            text_primary: Color::Rgb(248, 250, 252), // slate-50
            text_secondary: Color::Rgb(148, 163, 184), // slate-400
            text_muted: Color::Rgb(100, 116, 139),   // slate-500

            border_active: Color::Rgb(34, 211, 238), // cyan-400
            border_inactive: Color::Rgb(71, 85, 105), // slate-600

            bg_header: Color::Rgb(30, 41, 59), // slate-800
        }
    }

    /// Style for active/focused borders.
    #[inline]
    #[must_use]
    pub fn border_active_style(&self) -> Style {
        Style::default().fg(self.border_active)
    }

    /// Style for inactive borders.
    #[inline]
    #[must_use]
    pub fn border_inactive_style(&self) -> Style {
        Style::default().fg(self.border_inactive)
    }

    /// Style for titles.
    #[inline]
    #[must_use]
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for header/app bar.
    #[inline]
    #[must_use]
    pub fn header_style(&self) -> Style {
        Style::default().bg(self.bg_header)
    }

    /// Key hint style, dimmed when the action is unavailable.
    #[must_use]
    pub fn key_style(&self, enabled: bool) -> Style {
        if enabled {
            Style::default()
                .fg(self.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text_muted)
        }
    }
}

/// Default border type for all blocks (rounded for modern look).
pub const BORDER_TYPE: BorderType = BorderType::Rounded;
