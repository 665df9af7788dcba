//! Terminal UI for the incident console
//!
//! Owns the real terminal: raw mode, the alternate screen, input polling
//! and drawing. All behavior lives in [`crate::console`].

pub mod controller;
pub mod events;
pub mod theme;
pub mod view;

pub use controller::TuiController;
pub use theme::Theme;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::panic;

use crate::console::{Console, ScheduledJob, Scheduler};

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable terminal raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal backend")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal state before printing panic info
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Run the console in the current terminal with the given periodic jobs
pub async fn run(console: Console, jobs: Vec<ScheduledJob>) -> Result<()> {
    if !crossterm::tty::IsTty::is_tty(&io::stdout()) {
        anyhow::bail!("triage requires a real terminal (TTY)");
    }

    install_panic_hook();
    let terminal = setup_terminal()?;
    let _scheduler = Scheduler::start(jobs, console.sender());

    let mut controller = TuiController::new(terminal, console);
    let result = controller.run().await;

    restore_terminal()?;
    result
}
