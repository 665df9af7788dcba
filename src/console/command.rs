//! Console commands
//!
//! A [`Cmd`] describes one unit of asynchronous work. The reducer only
//! returns commands; the executor runs them and turns each into the message
//! it resolves to.

use super::message::Msg;
use crate::editor::EditRequest;
use crate::pagerduty::{Incident, ListFilter, User};

/// Work requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Run every command independently; no completion order
    Batch(Vec<Cmd>),

    /// Run commands one after another, delivering each result in order
    Sequence(Vec<Cmd>),

    /// Deliver a message without doing any work
    Emit(Msg),

    FetchCurrentUser,

    FetchIncidentList(ListFilter),

    FetchIncident(String),

    FetchIncidentNotes(String),

    FetchIncidentAlerts(String),

    /// Foreground: needs the terminal while the editor runs
    OpenEditor(EditRequest),

    AddNote {
        incident_id: String,
        content: String,
    },

    Acknowledge(Vec<Incident>),

    ReassignToUsers {
        incidents: Vec<Incident>,
        users: Vec<User>,
    },

    ReassignToPolicy {
        incidents: Vec<Incident>,
        policy_id: String,
        verb: &'static str,
    },

    Login {
        argv: Vec<String>,
    },

    OpenBrowser {
        argv: Vec<String>,
    },
}

impl Cmd {
    /// Combine optional commands into one, flattening a single entry
    pub fn batch(cmds: impl IntoIterator<Item = Option<Cmd>>) -> Option<Cmd> {
        let mut cmds: Vec<Cmd> = cmds.into_iter().flatten().collect();
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            Cmd::Batch(_) => "batch",
            Cmd::Sequence(_) => "sequence",
            Cmd::Emit(_) => "emit",
            Cmd::FetchCurrentUser => "fetch-current-user",
            Cmd::FetchIncidentList(_) => "fetch-incident-list",
            Cmd::FetchIncident(_) => "fetch-incident",
            Cmd::FetchIncidentNotes(_) => "fetch-incident-notes",
            Cmd::FetchIncidentAlerts(_) => "fetch-incident-alerts",
            Cmd::OpenEditor(_) => "open-editor",
            Cmd::AddNote { .. } => "add-note",
            Cmd::Acknowledge(_) => "acknowledge",
            Cmd::ReassignToUsers { .. } => "reassign-to-users",
            Cmd::ReassignToPolicy { .. } => "reassign-to-policy",
            Cmd::Login { .. } => "login",
            Cmd::OpenBrowser { .. } => "open-browser",
        }
    }
}
