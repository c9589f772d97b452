//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! Loader payloads are turned into `Text` by [`views`]; [`screen`] lays the
//! panes out and draws a frame.  No I/O happens here.

pub mod layout;
pub mod screen;
pub mod spinner;
pub mod theme;
pub mod views;
