//! A terminal demo of cancellable async loading.
//!
//! Route pages are resolved lazily (with a simulated fetch delay) and a
//! small GraphQL pane runs queries against an endpoint.  Switch routes or
//! resubmit queries faster than they resolve: only the latest request is
//! ever shown.

mod app;
mod config;
mod core;
mod ui;

use std::fs::File;
use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{AppState, Focus},
};
use crate::config::AppConfig;
use crate::core::pages::Route;

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Lazy route pages and a tiny GraphQL pane")]
struct Cli {
    /// Route to open first (`/`, `/products`, `/contact`, `/missing`).
    #[arg(long, default_value = "/")]
    route: String,

    /// GraphQL endpoint (overrides the config file).
    #[arg(long)]
    endpoint: Option<String>,

    /// Query to run on startup.
    #[arg(long)]
    query: Option<String>,

    /// Simulated page fetch delay in milliseconds (overrides the config file).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Write logs here (filtered by `RUST_LOG`).  Discarded otherwise.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the config file path and exit.
    #[arg(long)]
    print_config: bool,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // The TUI owns the terminal; nothing may be written to it.
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    if cli.print_config {
        println!("{}", config::config_path().display());
        return Ok(());
    }

    let route = Route::from_path(&cli.route)
        .with_context(|| format!("unknown route {:?}", cli.route))?;

    let mut config = AppConfig::load();
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(delay) = cli.delay_ms {
        config.page_delay_ms = delay;
    }
    tracing::info!(endpoint = %config.endpoint, %route, "starting");

    let tick_rate = config.tick_rate();
    let mut state = AppState::new(config, route, cli.query);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let mut events = spawn_event_reader(tick_rate);
    let result = run(&mut terminal, &mut state, &mut events).await;

    // ── teardown ──────────────────────────────────────────────
    state.teardown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    state: &mut AppState,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::screen::draw(frame, state))?;

        // Loader completions are applied here, on the UI task, never from
        // the tasks running the operations.
        tokio::select! {
            Some(event) = events.recv() => match event {
                AppEvent::Key(k) => handler::handle_key(state, k),
                AppEvent::Resize(_, _) => {}
                AppEvent::Tick => state.tick = state.tick.wrapping_add(1),
            },
            Some(settled) = state.pages.settle() => state.record(Focus::Pages, settled),
            Some(settled) = state.query.settle() => state.record(Focus::Query, settled),
            else => {
                tracing::warn!("event reader stopped");
                break;
            }
        }

        // Anything else already queued lands in the same frame.
        state.drain_completions();

        if state.should_quit {
            break;
        }
    }
    Ok(())
}
