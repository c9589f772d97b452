//! Cancellable async loading with last-request-wins semantics.
//!
//! An [`AsyncLoader`] runs one operation per distinct request on a spawned
//! tokio task.  Each completion travels back over a channel tagged with the
//! generation it was issued under, and the owner applies it only while that
//! generation is still current and the loader hasn't been torn down.  The
//! underlying operation is never aborted; superseded results are dropped.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc;

type OperationFn<R, P, E> = Arc<dyn Fn(R) -> BoxFuture<'static, Result<P, E>> + Send + Sync>;

// ───────────────────────────────────────── state ─────────────

/// Where a loader currently is.  Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<R, P, E> {
    /// No request issued yet.
    Idle,
    Loading { request: R },
    Resolved { request: R, payload: P },
    Failed { request: R, error: E },
}

impl<R, P, E> LoadState<R, P, E> {
    /// The most recently issued request, if any.
    pub fn request(&self) -> Option<&R> {
        match self {
            Self::Idle => None,
            Self::Loading { request }
            | Self::Resolved { request, .. }
            | Self::Failed { request, .. } => Some(request),
        }
    }

    /// `true` for `Idle` and `Loading` (both show the placeholder).
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Idle | Self::Loading { .. })
    }
}

/// Owner-held mount flag.  `TornDown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Mounted,
    TornDown,
}

/// Why a completion was dropped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// The request it was issued for has since been superseded.
    Stale,
    /// It arrived after [`AsyncLoader::teardown`].
    TornDown,
}

/// What applying a single completion did to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Resolved,
    Failed,
    Discarded(Discard),
}

// ───────────────────────────────────────── rendering ─────────

/// Output types that have a built-in loading placeholder and a generic
/// error indicator.
pub trait Placeholder {
    fn loading() -> Self;
    fn failed() -> Self;
}

impl Placeholder for String {
    fn loading() -> Self {
        "Loading...".to_string()
    }

    fn failed() -> Self {
        "Something went wrong.".to_string()
    }
}

/// Turns a resolved payload (and optionally an error) into output.
pub struct Renderer<P, E, O> {
    render: Box<dyn Fn(&P) -> O + Send>,
    fallback: Option<Box<dyn Fn(&E) -> O + Send>>,
}

impl<P, E, O> Renderer<P, E, O> {
    pub fn new(render: impl Fn(&P) -> O + Send + 'static) -> Self {
        Self {
            render: Box::new(render),
            fallback: None,
        }
    }

    /// Render errors with `fallback` instead of the generic indicator.
    pub fn fallback(mut self, fallback: impl Fn(&E) -> O + Send + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

// ───────────────────────────────────────── loader ────────────

struct Completion<R, P, E> {
    generation: u64,
    request: R,
    result: Result<P, E>,
}

/// Drives one in-flight operation per distinct request and exposes exactly
/// one of {placeholder, payload, error} to its renderer.
pub struct AsyncLoader<R, P, E, O> {
    state: LoadState<R, P, E>,
    lifecycle: Lifecycle,
    /// Bumped on every new request and on teardown.
    generation: u64,
    /// Spawned operations whose completion hasn't been received yet.
    in_flight: usize,
    operation: OperationFn<R, P, E>,
    renderer: Renderer<P, E, O>,
    tx: mpsc::UnboundedSender<Completion<R, P, E>>,
    rx: mpsc::UnboundedReceiver<Completion<R, P, E>>,
}

impl<R, P, E, O> AsyncLoader<R, P, E, O>
where
    R: Clone + PartialEq + fmt::Debug + Send + 'static,
    P: Send + 'static,
    E: fmt::Display + Send + 'static,
    O: Placeholder,
{
    /// Mount a loader and immediately start `operation(request)`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<F, Fut>(request: R, operation: F, renderer: Renderer<P, E, O>) -> Self
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, E>> + Send + 'static,
    {
        let mut loader = Self::idle(operation, renderer);
        loader.begin(request);
        loader
    }

    /// Mount a loader without issuing a request.  It stays `Idle` until the
    /// first [`on_request_changed`](Self::on_request_changed).
    pub fn idle<F, Fut>(operation: F, renderer: Renderer<P, E, O>) -> Self
    where
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, E>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: LoadState::Idle,
            lifecycle: Lifecycle::Mounted,
            generation: 0,
            in_flight: 0,
            operation: Arc::new(move |request| operation(request).boxed()),
            renderer,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &LoadState<R, P, E> {
        &self.state
    }

    pub fn request(&self) -> Option<&R> {
        self.state.request()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Switch to `request` if it differs from the current one.  Returns
    /// `true` when a new operation was started.
    pub fn on_request_changed(&mut self, request: R) -> bool {
        if self.lifecycle == Lifecycle::TornDown {
            tracing::debug!(?request, "request change ignored after teardown");
            return false;
        }
        if self.state.request() == Some(&request) {
            return false;
        }
        self.begin(request);
        true
    }

    /// Re-run the operation for the current request.  No-op when idle or
    /// torn down.
    pub fn reload(&mut self) -> bool {
        if self.lifecycle == Lifecycle::TornDown {
            return false;
        }
        let Some(request) = self.state.request().cloned() else {
            return false;
        };
        self.begin(request);
        true
    }

    /// Render the current state.  Pure: same state, same output.
    pub fn current_view(&self) -> O {
        match &self.state {
            LoadState::Idle | LoadState::Loading { .. } => O::loading(),
            LoadState::Resolved { payload, .. } => (self.renderer.render)(payload),
            LoadState::Failed { error, .. } => match &self.renderer.fallback {
                Some(fallback) => fallback(error),
                None => O::failed(),
            },
        }
    }

    /// Stop accepting completions.  State is frozen as it was at this point.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.lifecycle = Lifecycle::TornDown;
        self.generation = self.generation.wrapping_add(1);
        tracing::debug!(in_flight = self.in_flight, "loader torn down");
    }

    /// Wait for the next completion and apply it.  Returns `None` straight
    /// away when nothing is in flight.
    pub async fn settle(&mut self) -> Option<Settled> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Apply one completion if it is already waiting, without blocking.
    pub fn try_settle(&mut self) -> Option<Settled> {
        let completion = self.rx.try_recv().ok()?;
        Some(self.apply(completion))
    }

    fn begin(&mut self, request: R) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.state = LoadState::Loading {
            request: request.clone(),
        };
        self.in_flight += 1;
        tracing::debug!(generation, ?request, "load started");

        let work = (self.operation)(request.clone());
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = work.await;
            // Receiver gone means the loader was dropped.
            let _ = tx.send(Completion {
                generation,
                request,
                result,
            });
        });
    }

    fn apply(&mut self, completion: Completion<R, P, E>) -> Settled {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion {
            generation,
            request,
            result,
        } = completion;

        if self.lifecycle == Lifecycle::TornDown {
            tracing::debug!(generation, ?request, "completion after teardown dropped");
            return Settled::Discarded(Discard::TornDown);
        }
        if generation != self.generation || self.state.request() != Some(&request) {
            tracing::debug!(
                generation,
                current = self.generation,
                ?request,
                "stale completion dropped"
            );
            return Settled::Discarded(Discard::Stale);
        }

        match result {
            Ok(payload) => {
                tracing::debug!(generation, ?request, "load resolved");
                self.state = LoadState::Resolved { request, payload };
                Settled::Resolved
            }
            Err(error) => {
                tracing::warn!(generation, ?request, %error, "load failed");
                self.state = LoadState::Failed { request, error };
                Settled::Failed
            }
        }
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    type Gate = oneshot::Sender<Result<Value, String>>;
    type Gates = Arc<Mutex<HashMap<String, Vec<Gate>>>>;
    type TestLoader = AsyncLoader<String, Value, String, String>;

    /// An operation whose completions the test releases by hand.
    fn gated() -> (
        impl Fn(String) -> BoxFuture<'static, Result<Value, String>> + Send + Sync + 'static,
        Gates,
    ) {
        let gates: Gates = Arc::default();
        let registry = Arc::clone(&gates);
        let operation = move |request: String| {
            let (tx, rx) = oneshot::channel();
            registry.lock().unwrap().entry(request).or_default().push(tx);
            async move { rx.await.unwrap_or_else(|_| Err("gate dropped".to_string())) }.boxed()
        };
        (operation, gates)
    }

    fn release(gates: &Gates, request: &str, result: Result<Value, String>) {
        let tx = gates.lock().unwrap().get_mut(request).unwrap().remove(0);
        tx.send(result).unwrap();
    }

    fn renderer() -> Renderer<Value, String, String> {
        Renderer::new(|payload: &Value| format!("page: {}", payload["page"]))
    }

    fn with_fallback() -> Renderer<Value, String, String> {
        renderer().fallback(|error: &String| format!("error: {error}"))
    }

    #[tokio::test]
    async fn shows_placeholder_until_resolved() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());

        assert!(matches!(loader.state(), LoadState::Loading { request } if request == "home"));
        assert_eq!(loader.current_view(), "Loading...");

        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));

        let expected = (renderer().render)(&json!({ "page": "Home" }));
        assert_eq!(loader.current_view(), expected);
    }

    #[tokio::test]
    async fn latest_request_wins_when_older_finishes_last() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());
        assert!(loader.on_request_changed("products".into()));

        release(&gates, "products", Ok(json!({ "page": "Products" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));
        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(loader.settle().await, Some(Settled::Discarded(Discard::Stale)));

        assert_eq!(loader.current_view(), "page: \"Products\"");
        assert_eq!(loader.request().map(String::as_str), Some("products"));
    }

    #[tokio::test]
    async fn latest_request_wins_when_older_finishes_first() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());
        loader.on_request_changed("products".into());

        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(loader.settle().await, Some(Settled::Discarded(Discard::Stale)));
        assert_eq!(loader.current_view(), "Loading...");

        release(&gates, "products", Ok(json!({ "page": "Products" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));
        assert_eq!(loader.current_view(), "page: \"Products\"");
        assert_eq!(loader.settle().await, None);
    }

    #[tokio::test]
    async fn only_the_last_of_many_changes_applies() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("a".into(), op, with_fallback());
        loader.on_request_changed("b".into());
        loader.on_request_changed("c".into());
        assert_eq!(loader.in_flight(), 3);

        release(&gates, "c", Err("boom".into()));
        release(&gates, "a", Ok(json!({ "page": "A" })));
        release(&gates, "b", Ok(json!({ "page": "B" })));

        let mut outcomes = Vec::new();
        while let Some(settled) = loader.settle().await {
            outcomes.push(settled);
        }
        assert_eq!(
            outcomes.iter().filter(|s| **s == Settled::Failed).count(),
            1
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|s| **s == Settled::Discarded(Discard::Stale))
                .count(),
            2
        );
        assert_eq!(loader.current_view(), "error: boom");
    }

    #[tokio::test]
    async fn rejection_goes_through_fallback() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, with_fallback());

        release(&gates, "home", Err("network down".into()));
        assert_eq!(loader.settle().await, Some(Settled::Failed));

        assert!(matches!(
            loader.state(),
            LoadState::Failed { error, .. } if error == "network down"
        ));
        assert_eq!(loader.current_view(), "error: network down");
    }

    #[tokio::test]
    async fn rejection_without_fallback_uses_generic_indicator() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());

        release(&gates, "home", Err("network down".into()));
        loader.settle().await;

        assert_eq!(loader.current_view(), String::failed());
    }

    #[tokio::test]
    async fn completion_after_teardown_is_ignored() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());
        let before = loader.current_view();

        loader.teardown();
        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(
            loader.settle().await,
            Some(Settled::Discarded(Discard::TornDown))
        );

        assert_eq!(loader.current_view(), before);
        assert_eq!(loader.lifecycle(), Lifecycle::TornDown);
        assert!(!loader.on_request_changed("products".into()));
        assert!(!loader.reload());
    }

    #[tokio::test]
    async fn view_is_stable_between_transitions() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());
        assert_eq!(loader.current_view(), loader.current_view());

        release(&gates, "home", Ok(json!({ "page": "Home" })));
        loader.settle().await;
        assert_eq!(loader.current_view(), loader.current_view());
    }

    #[tokio::test]
    async fn same_request_does_not_restart() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());

        assert!(!loader.on_request_changed("home".into()));
        assert_eq!(loader.in_flight(), 1);
        assert_eq!(gates.lock().unwrap()["home"].len(), 1);
    }

    #[tokio::test]
    async fn reload_reissues_the_current_request() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, with_fallback());
        release(&gates, "home", Err("flaky".into()));
        assert_eq!(loader.settle().await, Some(Settled::Failed));

        assert!(loader.reload());
        assert_eq!(loader.current_view(), "Loading...");
        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));
        assert_eq!(loader.current_view(), "page: \"Home\"");
    }

    #[tokio::test]
    async fn reload_supersedes_the_earlier_attempt() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::new("home".into(), op, renderer());
        loader.reload();

        release(&gates, "home", Ok(json!({ "page": "First" })));
        assert_eq!(loader.settle().await, Some(Settled::Discarded(Discard::Stale)));
        release(&gates, "home", Ok(json!({ "page": "Second" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));
        assert_eq!(loader.current_view(), "page: \"Second\"");
    }

    #[tokio::test]
    async fn idle_loader_waits_for_a_request() {
        let (op, gates) = gated();
        let mut loader: TestLoader = AsyncLoader::idle(op, renderer());

        assert_eq!(loader.state(), &LoadState::Idle);
        assert_eq!(loader.current_view(), "Loading...");
        assert_eq!(loader.settle().await, None);
        assert!(loader.try_settle().is_none());
        assert!(!loader.reload());

        assert!(loader.on_request_changed("home".into()));
        release(&gates, "home", Ok(json!({ "page": "Home" })));
        assert_eq!(loader.settle().await, Some(Settled::Resolved));
    }
}
