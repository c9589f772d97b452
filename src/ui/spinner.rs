//! Loading indicator — a small spinner + label drawn on a pane's top border
//! while its loader is pending.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick as usize) % SPINNER_FRAMES.len()]
}

/// Invisible when `visible` is false or the area is too narrow.
pub struct LoadingIndicator<'a> {
    pub visible: bool,
    pub tick: u64,
    /// What is loading, e.g. a route path.
    pub label: &'a str,
}

impl Widget for LoadingIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible || area.height == 0 {
            return;
        }

        let label = format!(" {} loading {} ", frame(self.tick), self.label);
        let label_width = label.chars().count() as u16;
        if area.width < label_width + 4 {
            return;
        }
        // Top-right, leaving a column for the border corner.
        let x = area.x + area.width.saturating_sub(label_width + 2);
        let y = area.y;

        let line = Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

        buf.set_line(x, y, &line, label_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_wrap_around() {
        assert_eq!(frame(0), frame(SPINNER_FRAMES.len() as u64));
        assert_ne!(frame(0), frame(1));
    }

    #[test]
    fn draws_on_top_border_only_when_visible() {
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        LoadingIndicator { visible: false, tick: 0, label: "/" }.render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));

        LoadingIndicator { visible: true, tick: 0, label: "/" }.render(area, &mut buf);
        let top: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(top.contains("loading /"));
    }
}
