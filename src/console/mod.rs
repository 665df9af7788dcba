//! Incident console core
//!
//! Message-driven: terminal input and timer ticks become [`Msg`]s, the
//! reducer ([`update`]) mutates [`State`] and returns an optional [`Cmd`],
//! and the [`Executor`] runs commands on tokio tasks whose results come back
//! as messages. Nothing in here draws to the terminal.

pub mod command;
pub mod detail;
pub mod dispatch;
pub mod engine;
pub mod executor;
pub mod keymap;
pub mod message;
pub mod scheduler;
pub mod state;
pub mod update;

pub use command::Cmd;
pub use engine::{Console, Detached, TerminalHandover};
pub use executor::Executor;
pub use message::{ConsoleError, Msg, SelectedAction};
pub use scheduler::{default_jobs, ScheduledJob, Scheduler};
pub use state::{FilterMode, Focus, LoadFlags, Settings, State, ViewMode};
pub use update::update;
