//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── content ────────────────────────────────────────────────
    pub fn heading_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn body_style() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn json_key_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn error_style() -> Style {
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted_style() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style(focused: bool) -> Style {
        if focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn active_tab_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn command_input_style() -> Style {
        Style::default().fg(Color::Yellow)
    }
}
