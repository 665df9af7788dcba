//! The reducer
//!
//! `update` is the only place [`State`] changes. It never performs I/O; any
//! work it needs done is returned as a [`Cmd`] for the executor.

use std::fmt::Display;

use super::command::Cmd;
use super::dispatch;
use super::message::{ConsoleError, Fetched, Msg, SelectedAction};
use super::state::{list_status, Awaiting, Continuation, Focus, Pending, State};
use crate::editor::EditRequest;
use crate::pagerduty::{Alert, ClientError, Incident, Note, User};

pub const NO_SELECTION: &str = "no incident selected";
pub const NO_INCIDENTS: &str = "no incidents selected";
pub const EMPTY_NOTE: &str = "note is empty, nothing added";

/// Apply one message to the state
pub fn update(state: &mut State, msg: Msg) -> Option<Cmd> {
    match msg {
        Msg::Key(key) => dispatch::handle_key(state, key),
        Msg::Resize(width, height) => {
            state.window = (width, height);
            None
        }
        Msg::Tick(now) => {
            state.now = now;
            None
        }
        Msg::Error(error) => {
            record_error(state, error);
            None
        }

        Msg::PollIncidents | Msg::RefreshIncidentList => {
            state.status = "refreshing incident list...".to_string();
            Some(Cmd::FetchIncidentList(state.settings.list_filter.clone()))
        }
        Msg::GetIncident(id) => {
            state.status = format!("loading incident {}...", id);
            Some(Cmd::FetchIncident(id))
        }
        Msg::GetIncidentNotes(id) => {
            state.status = format!("loading notes for {}...", id);
            Some(Cmd::FetchIncidentNotes(id))
        }
        Msg::GetIncidentAlerts(id) => {
            state.status = format!("loading alerts for {}...", id);
            Some(Cmd::FetchIncidentAlerts(id))
        }

        Msg::GotCurrentUser(result) => got_current_user(state, result),
        Msg::GotIncidentList(result) => got_incident_list(state, result),
        Msg::GotIncident {
            incident_id,
            result,
        } => got_incident(state, incident_id, result),
        Msg::GotIncidentNotes {
            incident_id,
            result,
        } => got_notes(state, incident_id, result),
        Msg::GotIncidentAlerts {
            incident_id,
            result,
        } => got_alerts(state, incident_id, result),

        Msg::RenderIncident => render_incident(state),

        Msg::WaitForSelectedIncident {
            incident_id,
            action,
            tag,
        } => wait_for_selected(state, incident_id, Continuation::Run(*action), tag),
        Msg::WaitForSelectedIncidentsThenAcknowledge { incident_id } => wait_for_selected(
            state,
            incident_id,
            Continuation::AcknowledgeSelected,
            "acknowledge",
        ),

        Msg::AddNote => match &state.selected {
            Some(incident) => {
                let request = EditRequest::for_incident(incident);
                state.status = format!("editing note for {}...", request.incident_id);
                Some(Cmd::OpenEditor(request))
            }
            None => guard(state, NO_SELECTION),
        },
        Msg::EditorFinished(result) => match result {
            Ok(content) => match state.selected_id().map(str::to_string) {
                Some(incident_id) => {
                    state.status = format!("adding note to {}...", incident_id);
                    Some(Cmd::AddNote {
                        incident_id,
                        content,
                    })
                }
                None => guard(state, NO_SELECTION),
            },
            Err(e) => fail(state, "editing note", e),
        },
        Msg::NoteAdded(result) => note_added(state, result),

        Msg::Login => login(state),
        Msg::LoginFinished(result) => match result {
            Ok(()) => {
                state.status = "cluster login started".to_string();
                None
            }
            Err(e) => fail(state, "launching cluster login", e),
        },
        Msg::OpenBrowser => open_browser(state),
        Msg::BrowserOpened(result) => match result {
            Ok(()) => {
                state.status = "opened incident in browser".to_string();
                None
            }
            Err(e) => fail(state, "opening browser", e),
        },

        Msg::ActOnSelected(action) => act_on_selected(state, action),
        Msg::Acknowledge(incidents) => mutate(state, incidents, "acknowledging", Cmd::Acknowledge),
        Msg::Silence(incidents) => silence(state, incidents),
        Msg::ReEscalate(incidents) => re_escalate(state, incidents),
        Msg::Reassign { incidents, users } => reassign(state, incidents, users),
        Msg::Acknowledged(result) => match result {
            Ok(incidents) => {
                state.status = format!("acknowledged {}", count(incidents.len()));
                None
            }
            Err(e) => fail(state, "acknowledging incidents", e),
        },
        Msg::Reassigned { verb, result } => match result {
            Ok(incidents) => {
                state.status = format!("{} {}", verb, count(incidents.len()));
                None
            }
            Err(e) => fail(state, "reassigning incidents", e),
        },

        Msg::ClearSelection => {
            state.clear_selection();
            None
        }
    }
}

/// Put the console in Error mode
fn record_error(state: &mut State, error: ConsoleError) {
    tracing::error!("{}", error);
    state.status = error.to_string();
    state.error = Some(error);
}

fn fail(state: &mut State, context: impl Into<String>, err: impl Display) -> Option<Cmd> {
    record_error(state, ConsoleError::new(context, err));
    None
}

/// Refuse an action with a status line explaining why
fn guard(state: &mut State, reason: &str) -> Option<Cmd> {
    tracing::debug!("{}", reason);
    state.status = reason.to_string();
    None
}

fn rerender(state: &State) -> Option<Cmd> {
    state
        .viewing_detail()
        .then_some(Cmd::Emit(Msg::RenderIncident))
}

fn count(n: usize) -> String {
    if n == 1 {
        "1 incident".to_string()
    } else {
        format!("{} incidents", n)
    }
}

fn got_current_user(state: &mut State, result: Fetched<User>) -> Option<Cmd> {
    match result {
        Ok(user) => {
            tracing::info!("Signed in as {} ({})", user.name, user.id);
            state.current_user = Some(user);
            state.recompute_rows();
            None
        }
        Err(e) => fail(state, "fetching current user", e),
    }
}

fn got_incident_list(state: &mut State, result: Fetched<Vec<Incident>>) -> Option<Cmd> {
    match result {
        Ok(incidents) => {
            state.incidents = incidents;
            state.recompute_rows();
            state.status = list_status(state.rows.len(), state.incidents.len());
            None
        }
        Err(e) => fail(state, "fetching incident list", e),
    }
}

fn got_incident(state: &mut State, incident_id: String, result: Fetched<Incident>) -> Option<Cmd> {
    let incident = match result {
        Ok(incident) => incident,
        Err(e) => {
            let dropped = state.take_pending(Awaiting::Incident, &incident_id);
            if !dropped.is_empty() {
                tracing::warn!(
                    "Dropping {} action(s) waiting on incident {}",
                    dropped.len(),
                    incident_id
                );
            }
            return fail(state, format!("fetching incident {}", incident_id), e);
        }
    };

    let id = incident.id.clone();
    state.select_incident(incident);
    state.status = format!("loaded incident {}", id);

    let related = Cmd::Batch(vec![
        Cmd::FetchIncidentNotes(id.clone()),
        Cmd::FetchIncidentAlerts(id.clone()),
    ]);
    let released = release(state, Awaiting::Incident, &id);
    Cmd::batch([Some(related), rerender(state), released])
}

fn got_notes(state: &mut State, incident_id: String, result: Fetched<Vec<Note>>) -> Option<Cmd> {
    let notes = match result {
        Ok(notes) => notes,
        Err(e) => return fail(state, format!("fetching notes for {}", incident_id), e),
    };
    if !state.is_selected(&incident_id) {
        tracing::debug!("Discarding notes for {}, no longer selected", incident_id);
        return None;
    }

    state.notes = notes;
    state.loaded.notes = true;
    rerender(state)
}

fn got_alerts(state: &mut State, incident_id: String, result: Fetched<Vec<Alert>>) -> Option<Cmd> {
    let alerts = match result {
        Ok(alerts) => alerts,
        Err(e) => {
            state.take_pending(Awaiting::Alerts, &incident_id);
            return fail(state, format!("fetching alerts for {}", incident_id), e);
        }
    };
    if !state.is_selected(&incident_id) {
        tracing::debug!("Discarding alerts for {}, no longer selected", incident_id);
        state.take_pending(Awaiting::Alerts, &incident_id);
        return None;
    }

    state.alerts = alerts;
    state.loaded.alerts = true;
    let released = release(state, Awaiting::Alerts, &incident_id);
    Cmd::batch([rerender(state), released])
}

fn render_incident(state: &mut State) -> Option<Cmd> {
    if state.selected.is_none() {
        return guard(state, NO_SELECTION);
    }
    if !state.viewing_detail() {
        state.focus = Focus::Detail { scroll: 0 };
    }
    None
}

fn note_added(state: &mut State, result: Fetched<Note>) -> Option<Cmd> {
    match result {
        Ok(_) => {
            state.status = "note added".to_string();
            state
                .selected_id()
                .map(|id| Cmd::Emit(Msg::GetIncident(id.to_string())))
        }
        Err(ClientError::EmptyNote) => guard(state, EMPTY_NOTE),
        Err(e) => fail(state, "adding note", e),
    }
}

// ========== Dependency wait ==========

fn park(state: &mut State, pending: Pending) {
    tracing::debug!(
        "Parking {} until {:?} of incident {} arrives",
        pending.tag,
        pending.awaiting,
        pending.incident_id
    );
    if !state.pending.contains(&pending) {
        state.pending.push(pending);
    }
}

/// Turn a continuation into the command it stands for
fn resume(state: &State, continuation: Continuation) -> Cmd {
    match continuation {
        Continuation::Run(cmd) => cmd,
        Continuation::AcknowledgeSelected => {
            Cmd::Emit(Msg::Acknowledge(state.selected.iter().cloned().collect()))
        }
        Continuation::Login => Cmd::Emit(Msg::Login),
    }
}

/// Release every continuation parked on `awaiting` for `incident_id`
fn release(state: &mut State, awaiting: Awaiting, incident_id: &str) -> Option<Cmd> {
    let ready = state.take_pending(awaiting, incident_id);
    let state = &*state;
    Cmd::batch(ready.into_iter().map(|pending| {
        tracing::debug!("Releasing {} for incident {}", pending.tag, pending.incident_id);
        Some(resume(state, pending.continuation))
    }))
}

fn wait_for_selected(
    state: &mut State,
    incident_id: String,
    continuation: Continuation,
    tag: &'static str,
) -> Option<Cmd> {
    if state.is_selected(&incident_id) {
        tracing::debug!("Incident {} already loaded, running {}", incident_id, tag);
        return Some(resume(state, continuation));
    }
    park(
        state,
        Pending {
            incident_id,
            awaiting: Awaiting::Incident,
            continuation,
            tag,
        },
    );
    None
}

// ========== Operator actions ==========

fn login(state: &mut State) -> Option<Cmd> {
    let Some(incident_id) = state.selected_id().map(str::to_string) else {
        return guard(state, NO_SELECTION);
    };

    if !state.loaded.alerts {
        state.status = format!("waiting for alerts of {}...", incident_id);
        park(
            state,
            Pending {
                incident_id,
                awaiting: Awaiting::Alerts,
                continuation: Continuation::Login,
                tag: "login",
            },
        );
        return None;
    }

    // First alert wins when alerts disagree on the cluster
    let cluster_id = match state.alerts.first() {
        Some(alert) => alert.cluster_id(),
        None => {
            let reason = format!("incident {} has no alerts to log in from", incident_id);
            return guard(state, &reason);
        }
    };
    let Some(cluster_id) = cluster_id else {
        let reason = format!("no cluster id found in alerts of {}", incident_id);
        return guard(state, &reason);
    };

    let argv = match &state.settings.launcher {
        Some(launcher) => launcher.build_login_command(&cluster_id),
        None => return guard(state, "cluster login is not configured"),
    };
    state.status = format!("logging in to cluster {}...", cluster_id);
    Some(Cmd::Login { argv })
}

fn open_browser(state: &mut State) -> Option<Cmd> {
    let url = match &state.selected {
        Some(incident) => incident.html_url.clone(),
        None => return guard(state, NO_SELECTION),
    };
    if url.is_empty() {
        return guard(state, "incident has no URL");
    }

    let argv = match &state.settings.browser {
        Some(browser) => browser.command_for(&url),
        None => return guard(state, "no browser opener available on this platform"),
    };
    state.status = format!("opening {}...", url);
    Some(Cmd::OpenBrowser { argv })
}

fn act_on_selected(state: &mut State, action: SelectedAction) -> Option<Cmd> {
    let incidents: Vec<Incident> = state.selected.iter().cloned().collect();
    match action {
        SelectedAction::Acknowledge => mutate(state, incidents, "acknowledging", Cmd::Acknowledge),
        SelectedAction::Silence => silence(state, incidents),
        SelectedAction::ReEscalate => re_escalate(state, incidents),
        SelectedAction::Take => match state.current_user.clone() {
            Some(user) => reassign(state, incidents, vec![user]),
            None => guard(state, "current user is not loaded yet"),
        },
    }
}

/// Run a mutation, then drop the selection and refresh the list
fn mutate(
    state: &mut State,
    incidents: Vec<Incident>,
    progress: &str,
    build: impl FnOnce(Vec<Incident>) -> Cmd,
) -> Option<Cmd> {
    if incidents.is_empty() {
        return guard(state, NO_INCIDENTS);
    }
    state.status = format!("{} {}...", progress, count(incidents.len()));
    Some(Cmd::Sequence(vec![
        build(incidents),
        Cmd::Emit(Msg::ClearSelection),
        Cmd::Emit(Msg::RefreshIncidentList),
    ]))
}

fn silence(state: &mut State, incidents: Vec<Incident>) -> Option<Cmd> {
    let policy_id = state.settings.escalation.silent.clone();
    if policy_id.is_empty() {
        return guard(state, "no silent escalation policy configured");
    }
    mutate(state, incidents, "silencing", |incidents| Cmd::ReassignToPolicy {
        incidents,
        policy_id,
        verb: "silenced",
    })
}

fn re_escalate(state: &mut State, incidents: Vec<Incident>) -> Option<Cmd> {
    let policy_id = state.settings.escalation.default.clone();
    if policy_id.is_empty() {
        return guard(state, "no default escalation policy configured");
    }
    mutate(state, incidents, "re-escalating", |incidents| {
        Cmd::ReassignToPolicy {
            incidents,
            policy_id,
            verb: "re-escalated",
        }
    })
}

fn reassign(state: &mut State, incidents: Vec<Incident>, users: Vec<User>) -> Option<Cmd> {
    if users.is_empty() {
        return guard(state, "no users to reassign to");
    }
    mutate(state, incidents, "reassigning", |incidents| {
        Cmd::ReassignToUsers { incidents, users }
    })
}
