//! triage: terminal console for on-call incident triage
//!
//! This library provides:
//! - An incident API client behind the `IncidentService` trait
//! - A message-driven console core (reducer, command executor, scheduler)
//! - A ratatui front end for the console
//! - Helpers for cluster login, note editing and opening incidents in a browser

pub mod browser;
pub mod config;
pub mod console;
pub mod editor;
pub mod launcher;
pub mod pagerduty;
pub mod tui;

pub use config::Config;
pub use console::{Console, State};
