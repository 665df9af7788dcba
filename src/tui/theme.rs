//! Colors for the console

use ratatui::style::{Color, Modifier, Style};

/// Theme colors for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub border: Color,
    pub border_focused: Color,

    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    pub highlight_bg: Color,

    pub green: Color,
    pub yellow: Color,
    pub red: Color,
    pub blue: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

impl Theme {
    /// Catppuccin Mocha theme (default)
    pub fn catppuccin_mocha() -> Self {
        Self {
            border: Color::Rgb(49, 50, 68),
            border_focused: Color::Rgb(137, 180, 250),

            text_primary: Color::Rgb(205, 214, 244),
            text_secondary: Color::Rgb(166, 173, 200),
            text_muted: Color::Rgb(108, 112, 134),

            highlight_bg: Color::Rgb(69, 71, 90),

            green: Color::Rgb(166, 227, 161),
            yellow: Color::Rgb(249, 226, 175),
            red: Color::Rgb(243, 139, 168),
            blue: Color::Rgb(137, 180, 250),
        }
    }

    /// Color for an incident status
    pub fn status_style(&self, status: &str) -> Style {
        match status {
            "triggered" => Style::default().fg(self.red).add_modifier(Modifier::BOLD),
            "acknowledged" => Style::default().fg(self.yellow),
            "resolved" => Style::default().fg(self.green),
            _ => Style::default().fg(self.text_secondary),
        }
    }

    pub fn urgency_style(&self, urgency: &str) -> Style {
        match urgency {
            "high" => Style::default().fg(self.red),
            _ => Style::default().fg(self.text_muted),
        }
    }
}
