//! Terminal events
//!
//! Converts crossterm events into console messages.

use crossterm::event::{self, Event as CrosstermEvent};
use std::time::Duration;

use crate::console::Msg;

/// The console message for a terminal event, if it maps to one
pub fn to_msg(event: CrosstermEvent) -> Option<Msg> {
    match event {
        CrosstermEvent::Key(key) => Some(Msg::Key(key)),
        CrosstermEvent::Resize(width, height) => Some(Msg::Resize(width, height)),
        _ => None,
    }
}

/// Polls the terminal for input
pub struct EventSource {
    timeout: Duration,
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl EventSource {
    /// `timeout` is how long a poll may block waiting for input
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The next pending terminal message, if any
    pub fn poll(&self) -> std::io::Result<Option<Msg>> {
        if event::poll(self.timeout)? {
            Ok(to_msg(event::read()?))
        } else {
            Ok(None)
        }
    }
}
