//! Input handling — maps key events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::{Action, DEFAULT_QUERY};
use crate::core::pages::Route;

use super::state::{AppState, Focus};

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, even mid-edit.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    if state.editing.is_some() {
        handle_edit_key(state, key);
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => state.should_quit = true,
        Action::NextRoute => {
            let route = state.route.next();
            navigate(state, route);
        }
        Action::PrevRoute => {
            let route = state.route.prev();
            navigate(state, route);
        }
        Action::SwitchPane => {
            state.focus = match state.focus {
                Focus::Pages => Focus::Query,
                Focus::Query => Focus::Pages,
            };
        }
        Action::Reload => reload_focused(state),
        Action::EditQuery => {
            state.focus = Focus::Query;
            let current = state.query.request().cloned().unwrap_or_default();
            state.editing = Some(current);
        }
        Action::RunQuery => {
            if state.focus != Focus::Query {
                return;
            }
            if !state.query.reload() {
                submit_query(state, DEFAULT_QUERY.to_string());
            }
        }
    }
}

fn navigate(state: &mut AppState, route: Route) {
    state.route = route;
    if state.pages.on_request_changed(route) {
        tracing::debug!(%route, "navigated");
    }
    state.status_message = None;
}

fn reload_focused(state: &mut AppState) {
    let reloaded = match state.focus {
        Focus::Pages => state.pages.reload(),
        Focus::Query => state.query.reload(),
    };
    state.status_message = if reloaded {
        None
    } else {
        Some("Nothing to reload yet".into())
    };
}

fn handle_edit_key(state: &mut AppState, key: KeyEvent) {
    let Some(buffer) = state.editing.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Esc => state.editing = None,
        KeyCode::Enter => {
            let query = buffer.trim().to_string();
            state.editing = None;
            if query.is_empty() {
                state.status_message = Some("Empty query ignored".into());
            } else {
                submit_query(state, query);
            }
        }
        _ => {}
    }
}

fn submit_query(state: &mut AppState, query: String) {
    state.status_message = if state.query.on_request_changed(query) {
        None
    } else {
        let hint = state.config.short_binding(Action::Reload);
        Some(format!("Query unchanged ({hint} to re-run)"))
    };
}
