//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use chrono::{DateTime, Local};
use ratatui::text::Text;
use serde_json::Value;

use crate::config::AppConfig;
use crate::core::{
    graphql::{GraphqlClient, QueryError},
    loader::{AsyncLoader, Settled},
    pages::{Page, PageError, PageProvider, Route},
};
use crate::ui::views;

pub type PageLoader = AsyncLoader<Route, Page, PageError, Text<'static>>;
pub type QueryLoader = AsyncLoader<String, Value, QueryError, Text<'static>>;

/// Which pane receives route/reload keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Pages,
    Query,
}

/// Top-level application state.
pub struct AppState {
    /// Route the user last navigated to.  The page loader may still be
    /// resolving it.
    pub route: Route,
    pub pages: PageLoader,
    pub query: QueryLoader,
    pub focus: Focus,
    /// Query being typed; `Some` while the input line has the cursor.
    pub editing: Option<String>,
    pub config: AppConfig,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// Drives the spinner.
    pub tick: u64,
    pub pages_settled_at: Option<DateTime<Local>>,
    pub query_settled_at: Option<DateTime<Local>>,
}

impl AppState {
    /// Mount both loaders.  The page for `route` starts loading right
    /// away; the query pane only if `initial_query` is given.
    pub fn new(config: AppConfig, route: Route, initial_query: Option<String>) -> Self {
        let provider = PageProvider::new(config.page_delay());
        let pages = AsyncLoader::new(
            route,
            move |route| provider.resolve(route),
            views::page_renderer(),
        );

        let client = GraphqlClient::new(config.endpoint.clone(), config.query_timeout());
        let run_query = move |query: String| {
            let client = client.clone();
            async move { client.query(&query).await }
        };
        let query = match initial_query {
            Some(q) => AsyncLoader::new(q, run_query, views::query_renderer()),
            None => AsyncLoader::idle(run_query, views::query_renderer()),
        };

        Self {
            route,
            pages,
            query,
            focus: Focus::default(),
            editing: None,
            config,
            status_message: None,
            should_quit: false,
            tick: 0,
            pages_settled_at: None,
            query_settled_at: None,
        }
    }

    /// Note a settled completion for `pane`.  Discards leave the timestamp alone.
    pub fn record(&mut self, pane: Focus, settled: Settled) {
        if !matches!(settled, Settled::Resolved | Settled::Failed) {
            return;
        }
        let now = Some(Local::now());
        match pane {
            Focus::Pages => self.pages_settled_at = now,
            Focus::Query => self.query_settled_at = now,
        }
    }

    /// Apply every completion that has already arrived.  Returns `true` if
    /// anything was received (applied or discarded).
    pub fn drain_completions(&mut self) -> bool {
        let mut received = false;

        while let Some(settled) = self.pages.try_settle() {
            received = true;
            self.record(Focus::Pages, settled);
        }
        while let Some(settled) = self.query.try_settle() {
            received = true;
            self.record(Focus::Query, settled);
        }

        received
    }

    /// Time the focused pane last resolved or failed.
    pub fn focused_settled_at(&self) -> Option<DateTime<Local>> {
        match self.focus {
            Focus::Pages => self.pages_settled_at,
            Focus::Query => self.query_settled_at,
        }
    }

    /// Unmount both loaders.  Anything still in flight is ignored from here on.
    pub fn teardown(&mut self) {
        self.pages.teardown();
        self.query.teardown();
        tracing::debug!(
            pages = ?self.pages.lifecycle(),
            query = ?self.query.lifecycle(),
            "loaders unmounted"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::loader::LoadState;

    /// Config with instant pages and an endpoint nothing listens on.
    pub(crate) fn test_config() -> AppConfig {
        AppConfig {
            endpoint: "http://127.0.0.1:1/graphql".into(),
            page_delay_ms: 0,
            query_timeout_ms: 200,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn mounts_page_loader_for_initial_route() {
        let mut state = AppState::new(test_config(), Route::Products, None);
        assert_eq!(state.pages.request(), Some(&Route::Products));
        assert_eq!(state.query.state(), &LoadState::Idle);

        assert_eq!(state.pages.settle().await, Some(Settled::Resolved));
        assert!(matches!(
            state.pages.state(),
            LoadState::Resolved { payload, .. } if payload.title == "Products"
        ));
    }

    #[tokio::test]
    async fn drain_records_settle_time() {
        let mut state = AppState::new(test_config(), Route::Missing, None);
        while state.pages.in_flight() > 0 {
            tokio::task::yield_now().await;
            state.drain_completions();
        }
        assert!(matches!(state.pages.state(), LoadState::Failed { .. }));
        assert!(state.pages_settled_at.is_some());
        assert_eq!(state.focused_settled_at(), state.pages_settled_at);
        assert!(state.query_settled_at.is_none());
    }

    #[tokio::test]
    async fn teardown_freezes_both_panes() {
        let mut state = AppState::new(test_config(), Route::Home, Some("{ humans }".into()));
        state.teardown();

        state.pages.settle().await;
        state.query.settle().await;
        assert!(state.pages.state().is_pending());
        assert!(state.query.state().is_pending());
        assert!(state.pages_settled_at.is_none());
    }
}
