//! Renderers handed to the loaders: payload/error → `Text`.

use ratatui::text::{Line, Span, Text};
use serde_json::Value;

use crate::core::{
    graphql::QueryError,
    loader::{Placeholder, Renderer},
    pages::{Page, PageError},
};
use crate::ui::theme::Theme;

impl Placeholder for Text<'static> {
    fn loading() -> Self {
        Text::styled("Loading...", Theme::muted_style())
    }

    fn failed() -> Self {
        Text::styled("Something went wrong.", Theme::error_style())
    }
}

pub fn page_renderer() -> Renderer<Page, PageError, Text<'static>> {
    Renderer::new(render_page).fallback(|err: &PageError| error_text("Page failed to load", err))
}

pub fn query_renderer() -> Renderer<Value, QueryError, Text<'static>> {
    Renderer::new(render_data).fallback(|err: &QueryError| error_text("Query failed", err))
}

fn render_page(page: &Page) -> Text<'static> {
    let mut lines = vec![
        Line::styled(page.title.clone(), Theme::heading_style()),
        Line::raw(""),
    ];
    lines.extend(
        page.body
            .iter()
            .map(|l| Line::styled(l.clone(), Theme::body_style())),
    );
    Text::from(lines)
}

/// Pretty-printed JSON; object keys highlighted.
fn render_data(data: &Value) -> Text<'static> {
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    let lines: Vec<Line<'static>> = pretty.lines().map(json_line).collect();
    Text::from(lines)
}

fn json_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    match trimmed.strip_prefix('"').and_then(|rest| rest.split_once("\": ")) {
        Some((key, value)) => Line::from(vec![
            Span::raw(indent.to_string()),
            Span::styled(format!("\"{key}\""), Theme::json_key_style()),
            Span::raw(format!(": {value}")),
        ]),
        None => Line::raw(line.to_string()),
    }
}

fn error_text(heading: &str, err: &impl std::fmt::Display) -> Text<'static> {
    Text::from(vec![
        Line::styled(format!("✗ {heading}"), Theme::error_style()),
        Line::raw(""),
        Line::raw(err.to_string()),
        Line::raw(""),
        Line::styled("Press r to retry.", Theme::muted_style()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn page_has_title_then_body() {
        let page = Page {
            title: "Home".into(),
            body: vec!["Welcome!".into()],
        };
        assert_eq!(plain(&render_page(&page)), vec!["Home", "", "Welcome!"]);
    }

    #[test]
    fn json_keys_are_split_out() {
        let text = render_data(&json!({ "humans": ["Luke"] }));
        let lines = plain(&text);
        assert_eq!(lines, vec!["{", "  \"humans\": [", "    \"Luke\"", "  ]", "}"]);
        assert_eq!(text.lines[1].spans[1].content, "\"humans\"");
    }

    #[test]
    fn errors_show_message() {
        let text = error_text("Query failed", &QueryError::Status(500));
        assert_eq!(plain(&text)[2], "server returned HTTP 500");
    }
}
