//! Frame composition.  Pure function of `&AppState`.

use ratatui::{
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::state::{AppState, Focus};
use crate::core::{loader::LoadState, pages::Route};
use crate::ui::{layout::AppLayout, spinner::LoadingIndicator, theme::Theme};

pub fn draw(frame: &mut Frame, state: &AppState) {
    let layout = AppLayout::from_area(frame.area());

    let tabs = Tabs::new(Route::ALL.iter().map(|r| format!(" {} ", r.label())))
        .select(state.route.index())
        .highlight_style(Theme::active_tab_style())
        .divider("│");
    frame.render_widget(tabs, layout.tabs_area);

    // ── page pane ──────────────────────────────────────────────
    let page_title = match state.pages.in_flight() {
        n if n > 1 => format!(" {} · {n} in flight ", state.route.path()),
        _ => format!(" {} ", state.route.path()),
    };
    let page_block = pane_block(page_title, state.focus == Focus::Pages);
    let page = Paragraph::new(state.pages.current_view())
        .block(page_block)
        .wrap(Wrap { trim: false });
    frame.render_widget(page, layout.page_area);
    frame.render_widget(
        LoadingIndicator {
            visible: state.pages.state().is_pending(),
            tick: state.tick,
            label: state.route.path(),
        },
        layout.page_area,
    );

    // ── query pane ─────────────────────────────────────────────
    let focused = state.focus == Focus::Query;
    let (input, input_style) = match &state.editing {
        Some(buffer) => (format!("{buffer}▏"), Theme::command_input_style()),
        None => (
            state.query.request().cloned().unwrap_or_default(),
            Theme::body_style(),
        ),
    };
    let input_block = pane_block(format!(" query · {} ", state.config.endpoint), focused);
    frame.render_widget(
        Paragraph::new(input).style(input_style).block(input_block),
        layout.query_input_area,
    );

    let result_view = match state.query.state() {
        LoadState::Idle => Text::from(Line::styled(
            format!(
                "No query yet. Press {} to write one.",
                state.config.short_binding(crate::config::Action::EditQuery)
            ),
            Theme::muted_style(),
        )),
        _ => state.query.current_view(),
    };
    let result_block = pane_block(" result ".to_string(), focused);
    frame.render_widget(
        Paragraph::new(result_view).block(result_block),
        layout.query_area,
    );
    frame.render_widget(
        LoadingIndicator {
            visible: matches!(state.query.state(), LoadState::Loading { .. }),
            tick: state.tick,
            label: "query",
        },
        layout.query_area,
    );

    // ── status bar ─────────────────────────────────────────────
    let status = match (&state.status_message, state.focused_settled_at()) {
        (Some(msg), _) => msg.clone(),
        (None, Some(at)) => format!(
            "{} | settled {}",
            state.config.status_bar_hint(),
            at.format("%H:%M:%S")
        ),
        (None, None) => state.config.status_bar_hint(),
    };
    frame.render_widget(
        Paragraph::new(status).style(Theme::status_bar_style()),
        layout.status_area,
    );
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style(focused))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::tests::test_config;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, state)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn pending_page_shows_placeholder() {
        let state = AppState::new(test_config(), Route::Contact, None);
        let screen = render(&state);
        assert!(screen.contains("Loading..."));
        assert!(screen.contains("loading /contact"));
        assert!(screen.contains("No query yet. Press e"));
    }

    #[tokio::test]
    async fn resolved_page_is_drawn() {
        let mut state = AppState::new(test_config(), Route::Contact, None);
        state.pages.settle().await;
        let screen = render(&state);
        assert!(screen.contains("hello@example.com"));
        assert!(!screen.contains("loading /contact"));
    }
}
