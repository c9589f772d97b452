//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Route tabs on top, page and query panes side by side, status bar below.
pub struct AppLayout {
    pub tabs_area: Rect,
    pub page_area: Rect,
    pub query_input_area: Rect,
    pub query_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // route tabs
                Constraint::Min(5),    // panes
                Constraint::Length(1), // status bar
            ])
            .split(area);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let query = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(2)])
            .split(panes[1]);

        Self {
            tabs_area: rows[0],
            page_area: panes[0],
            query_input_area: query[0],
            query_area: query[1],
            status_area: rows[2],
        }
    }
}
