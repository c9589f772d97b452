//! Terminal event abstraction.
//!
//! Crossterm's `poll`/`read` block, so they run on a blocking thread and
//! forward a simplified event stream to the async main loop.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Nothing happened within the tick rate.  Used to advance the spinner
    /// and pick up loader completions.
    Tick,
}

/// Spawns the reader and returns its channel.  The reader exits once the
/// receiver is dropped.
pub fn spawn_event_reader(tick_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
        let app_event = match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                // Windows also reports releases.
                Ok(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => AppEvent::Key(k),
                Ok(CtEvent::Resize(w, h)) => AppEvent::Resize(w, h),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(%err, "terminal read failed");
                    break;
                }
            },
            Ok(false) => AppEvent::Tick,
            Err(err) => {
                tracing::warn!(%err, "terminal poll failed");
                break;
            }
        };
        if tx.send(app_event).is_err() {
            break;
        }
    });

    rx
}
