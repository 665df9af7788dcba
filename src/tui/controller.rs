//! TUI Controller
//!
//! Main loop coordinating the terminal and the console engine:
//! 1. Renders the current state
//! 2. Polls terminal input
//! 3. Processes messages produced by commands and scheduled jobs
//!
//! While the note editor runs the terminal is handed back to it.

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::Backend;
use ratatui::Terminal;
use std::time::Duration;

use super::events::EventSource;
use super::theme::Theme;
use super::view;
use crate::console::{Console, Msg, TerminalHandover};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Leaves raw mode and the alternate screen while a foreground program runs
struct Handover<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
}

impl<B: Backend> TerminalHandover for Handover<'_, B> {
    fn release(&mut self) -> std::io::Result<()> {
        tracing::debug!("Releasing terminal");
        disable_raw_mode()?;
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }

    fn restore(&mut self) -> std::io::Result<()> {
        tracing::debug!("Restoring terminal");
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen)?;
        self.terminal.clear()
    }
}

pub struct TuiController<B: Backend> {
    terminal: Terminal<B>,
    console: Console,
    events: EventSource,
    theme: Theme,
}

impl<B: Backend> TuiController<B> {
    pub fn new(terminal: Terminal<B>, console: Console) -> Self {
        Self {
            terminal,
            console,
            events: EventSource::default(),
            theme: Theme::default(),
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Run the main event loop until the operator quits
    pub async fn run(&mut self) -> Result<()> {
        if let Ok((width, height)) = crossterm::terminal::size() {
            self.console.process(Msg::Resize(width, height));
        }
        self.console.init();

        loop {
            // 1. Render current state
            let state = self.console.state();
            let theme = &self.theme;
            self.terminal
                .draw(|frame| view::render(frame, state, theme))?;

            // 2. Poll for user input (non-blocking)
            let mut handover = Handover {
                terminal: &mut self.terminal,
            };
            if let Some(msg) = self.events.poll()? {
                self.console.process_with(msg, &mut handover)?;
            }

            // 3. Process command results and scheduled messages
            self.console.drain_with(&mut handover)?;

            if self.console.should_quit() {
                tracing::info!("Console closed");
                break;
            }

            tokio::time::sleep(IDLE_SLEEP).await;
        }

        Ok(())
    }
}
