//! Focus-mode key dispatch
//!
//! A key press is resolved against the binding table of the active view
//! mode and handled by that mode's sub-reducer. `ctrl+c` quits from every
//! mode.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::command::Cmd;
use super::detail::{self, LOADING_DETAILS};
use super::keymap::{self, Action};
use super::message::{Msg, SelectedAction};
use super::state::{list_status, Focus, State, ViewMode};
use super::update::NO_SELECTION;
use crate::pagerduty::Incident;

const SCROLL_PAGE: u16 = 10;

/// Route a key press to the sub-reducer for the current mode
pub fn handle_key(state: &mut State, key: KeyEvent) -> Option<Cmd> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let mode = state.view_mode();
    let action = keymap::lookup(mode, &key);
    if action == Some(Action::Quit) {
        tracing::info!("Quit requested");
        state.should_quit = true;
        return None;
    }

    match mode {
        ViewMode::Error => error_key(state, action),
        ViewMode::TextInput => input_key(state, action, key),
        ViewMode::IncidentDetail => detail_key(state, action, key),
        ViewMode::Table => table_key(state, action),
    }
}

/// Fetch `incident_id`, then deliver `wait` once the fetch was issued
fn fetch_then(incident_id: String, wait: Msg) -> Cmd {
    Cmd::Sequence(vec![
        Cmd::Emit(Msg::GetIncident(incident_id)),
        Cmd::Emit(wait),
    ])
}

fn wait_then(incident_id: String, tag: &'static str, msg: Msg) -> Msg {
    Msg::WaitForSelectedIncident {
        incident_id,
        action: Box::new(Cmd::Emit(msg)),
        tag,
    }
}

fn error_key(state: &mut State, action: Option<Action>) -> Option<Cmd> {
    if action == Some(Action::Back) {
        state.error = None;
        state.status.clear();
    }
    None
}

fn input_key(state: &mut State, action: Option<Action>, key: KeyEvent) -> Option<Cmd> {
    match action {
        Some(Action::Back) => {
            state.input.reset();
            state.focus = Focus::Table;
        }
        // Nothing consumes submitted input yet
        Some(Action::Submit) => {}
        _ => match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.input.value.push(c);
            }
            KeyCode::Backspace => {
                state.input.value.pop();
            }
            _ => {}
        },
    }
    None
}

fn table_key(state: &mut State, action: Option<Action>) -> Option<Cmd> {
    let action = action?;
    let last = state.rows.len().checked_sub(1);

    match action {
        Action::Up => {
            state.cursor = state.cursor.map(|row| row.saturating_sub(1));
            None
        }
        Action::Down => {
            if let Some(last) = last {
                state.cursor = Some(state.cursor.map_or(0, |row| (row + 1).min(last)));
            }
            None
        }
        Action::Top => {
            state.cursor = last.map(|_| 0);
            None
        }
        Action::Bottom => {
            state.cursor = last;
            None
        }
        Action::Refresh => Some(Cmd::Emit(Msg::RefreshIncidentList)),
        Action::ToggleTeam => {
            state.filter = state.filter.toggle();
            state.recompute_rows();
            state.status = format!(
                "{}: {}",
                state.filter.label(),
                list_status(state.rows.len(), state.incidents.len())
            );
            None
        }
        Action::FocusInput => {
            state.focus = Focus::Input;
            None
        }
        Action::Help => {
            state.show_help = !state.show_help;
            None
        }
        row_action => act_on_row(state, row_action),
    }
}

/// Fetch the highlighted incident and run `action` once it is selected
fn act_on_row(state: &mut State, action: Action) -> Option<Cmd> {
    let Some(incident_id) = state.highlighted().map(|incident| incident.id.clone()) else {
        state.status = NO_SELECTION.to_string();
        return None;
    };

    let wait = match action {
        Action::View => wait_then(incident_id.clone(), "view", Msg::RenderIncident),
        Action::Acknowledge => Msg::WaitForSelectedIncidentsThenAcknowledge {
            incident_id: incident_id.clone(),
        },
        Action::Silence => wait_then(
            incident_id.clone(),
            "silence",
            Msg::ActOnSelected(SelectedAction::Silence),
        ),
        Action::ReEscalate => wait_then(
            incident_id.clone(),
            "re-escalate",
            Msg::ActOnSelected(SelectedAction::ReEscalate),
        ),
        Action::Take => wait_then(
            incident_id.clone(),
            "take",
            Msg::ActOnSelected(SelectedAction::Take),
        ),
        Action::Note => wait_then(incident_id.clone(), "note", Msg::AddNote),
        Action::Login => wait_then(incident_id.clone(), "login", Msg::Login),
        Action::Open => wait_then(incident_id.clone(), "open", Msg::OpenBrowser),
        _ => return None,
    };
    Some(fetch_then(incident_id, wait))
}

fn detail_key(state: &mut State, action: Option<Action>, key: KeyEvent) -> Option<Cmd> {
    let Some(action) = action else {
        scroll_detail(state, key);
        return None;
    };
    let selected: Vec<Incident> = state.selected.iter().cloned().collect();

    match action {
        Action::Back => {
            state.clear_selection();
            None
        }
        // Acting on loaded data never waits
        Action::Acknowledge => Some(Cmd::Emit(Msg::Acknowledge(selected))),
        Action::Silence => Some(Cmd::Emit(Msg::Silence(selected))),
        Action::ReEscalate => Some(Cmd::Emit(Msg::ReEscalate(selected))),
        Action::Take => Some(Cmd::Emit(Msg::ActOnSelected(SelectedAction::Take))),
        Action::Note | Action::Login | Action::Open if !state.loaded.detail => {
            state.status = LOADING_DETAILS.to_string();
            None
        }
        Action::Note => Some(Cmd::Emit(Msg::AddNote)),
        Action::Login => match state.selected_id() {
            Some(id) => Some(fetch_then(
                id.to_string(),
                wait_then(id.to_string(), "login", Msg::Login),
            )),
            None => Some(Cmd::Emit(Msg::Login)),
        },
        Action::Open => Some(Cmd::Emit(Msg::OpenBrowser)),
        Action::Refresh => state
            .selected_id()
            .map(|id| Cmd::Emit(Msg::GetIncident(id.to_string()))),
        Action::Help => {
            state.show_help = !state.show_help;
            None
        }
        _ => None,
    }
}

/// Unbound keys in the detail view scroll the viewport
fn scroll_detail(state: &mut State, key: KeyEvent) {
    let max = detail::max_scroll(state);
    let Focus::Detail { scroll } = &mut state.focus else {
        return;
    };
    let next = match key.code {
        KeyCode::Up => scroll.saturating_sub(1),
        KeyCode::Down => scroll.saturating_add(1),
        KeyCode::PageUp => scroll.saturating_sub(SCROLL_PAGE),
        KeyCode::PageDown => scroll.saturating_add(SCROLL_PAGE),
        KeyCode::Home => 0,
        KeyCode::End => max,
        _ => return,
    };
    *scroll = next.min(max);
}
