//! Console messages
//!
//! Every input to the reducer is one variant of [`Msg`]: terminal input,
//! timer ticks, fetch requests, fetch results and operator actions. The
//! set is closed so `update` can match on it exhaustively.

use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;

use super::command::Cmd;
use crate::editor::EditorError;
use crate::launcher::LaunchError;
use crate::pagerduty::{Alert, ClientError, Incident, Note, User};

/// Error surfaced in Error mode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {message}")]
pub struct ConsoleError {
    /// What the console was doing when it failed
    pub context: String,
    pub message: String,
}

impl ConsoleError {
    pub fn new(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

/// Operator action applied to whichever incident is selected when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedAction {
    Acknowledge,
    Silence,
    ReEscalate,
    /// Reassign to the current user
    Take,
}

/// Result of a fetch or mutation command
pub type Fetched<T> = Result<T, ClientError>;

/// Messages consumed by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // ========== Terminal ==========
    /// Key press, routed through the focus-mode dispatcher
    Key(KeyEvent),

    /// Terminal resize
    Resize(u16, u16),

    /// Heartbeat tick carrying the current time
    Tick(DateTime<Utc>),

    /// A failure reported from outside the reducer's own commands, sent
    /// through [`Console::sender`](super::Console::sender); puts the console
    /// in Error mode. Command results carry their own errors instead.
    Error(ConsoleError),

    // ========== Fetch requests ==========
    /// Scheduled poll of the incident list
    PollIncidents,

    RefreshIncidentList,

    GetIncident(String),

    GetIncidentNotes(String),

    GetIncidentAlerts(String),

    // ========== Fetch results ==========
    GotCurrentUser(Fetched<User>),

    GotIncidentList(Fetched<Vec<Incident>>),

    GotIncident {
        incident_id: String,
        result: Fetched<Incident>,
    },

    GotIncidentNotes {
        incident_id: String,
        result: Fetched<Vec<Note>>,
    },

    GotIncidentAlerts {
        incident_id: String,
        result: Fetched<Vec<Alert>>,
    },

    /// Show the selected incident in the detail view
    RenderIncident,

    // ========== Dependency wait ==========
    /// Run `action` once `incident_id` is the selected incident
    WaitForSelectedIncident {
        incident_id: String,
        action: Box<Cmd>,
        tag: &'static str,
    },

    /// Acknowledge `incident_id` once it is the selected incident
    WaitForSelectedIncidentsThenAcknowledge { incident_id: String },

    // ========== Operator actions ==========
    /// Open the note editor for the selected incident
    AddNote,

    EditorFinished(Result<String, EditorError>),

    NoteAdded(Fetched<Note>),

    Login,

    LoginFinished(Result<(), LaunchError>),

    OpenBrowser,

    BrowserOpened(Result<(), LaunchError>),

    /// Resolve a [`SelectedAction`] against the current selection
    ActOnSelected(SelectedAction),

    Acknowledge(Vec<Incident>),

    Acknowledged(Fetched<Vec<Incident>>),

    /// Reassign to the silent escalation policy
    Silence(Vec<Incident>),

    /// Reassign to the default escalation policy
    ReEscalate(Vec<Incident>),

    Reassign {
        incidents: Vec<Incident>,
        users: Vec<User>,
    },

    Reassigned {
        verb: &'static str,
        result: Fetched<Vec<Incident>>,
    },

    ClearSelection,
}
