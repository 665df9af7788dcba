//! Console state
//!
//! The single snapshot of UI and business state. Only the reducer mutates
//! it; the view reads it.

use chrono::{DateTime, Utc};

use super::command::Cmd;
use super::message::ConsoleError;
use crate::browser::BrowserCommand;
use crate::config::{Config, EscalationPolicies};
use crate::launcher::ClusterLauncher;
use crate::pagerduty::{Alert, Incident, ListFilter, Note, User};

/// Which of the four views is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Table,
    IncidentDetail,
    TextInput,
    Error,
}

/// Where keyboard focus is when no error is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Table,
    /// Viewing the selected incident; `scroll` is the viewport offset
    Detail { scroll: u16 },
    Input,
}

/// Which incidents the table shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Only incidents assigned to the current user
    #[default]
    Assigned,
    /// Every team incident not owned solely by ignored users
    Team,
}

impl FilterMode {
    pub fn toggle(self) -> Self {
        match self {
            FilterMode::Assigned => FilterMode::Team,
            FilterMode::Team => FilterMode::Assigned,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Assigned => "assigned to me",
            FilterMode::Team => "team",
        }
    }
}

/// Load progress of the selected incident's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadFlags {
    pub detail: bool,
    pub notes: bool,
    pub alerts: bool,
}

/// The text input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub prompt: String,
    pub value: String,
}

pub const DEFAULT_PROMPT: &str = "> ";

impl Default for InputLine {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            value: String::new(),
        }
    }
}

impl InputLine {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Data a parked continuation is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    /// The incident itself
    Incident,
    /// The incident's alerts
    Alerts,
}

/// What to run once a wait is satisfied
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    Run(Cmd),
    AcknowledgeSelected,
    Login,
}

/// A continuation parked until its prerequisite arrives
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub incident_id: String,
    pub awaiting: Awaiting,
    pub continuation: Continuation,
    pub tag: &'static str,
}

/// Read-only settings resolved at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub list_filter: ListFilter,
    pub ignored_users: Vec<String>,
    pub escalation: EscalationPolicies,
    pub launcher: Option<ClusterLauncher>,
    pub browser: Option<BrowserCommand>,
}

impl Settings {
    /// Resolve settings from the loaded configuration
    ///
    /// Cluster login is disabled when the launcher templates are incomplete.
    pub fn from_config(config: &Config) -> Self {
        let launcher = ClusterLauncher::from_config(config);
        let launcher = match launcher.validate() {
            Ok(()) => Some(launcher),
            Err(e) => {
                tracing::warn!("Cluster login disabled: {}", e);
                None
            }
        };

        Self {
            list_filter: ListFilter {
                team_ids: config.teams.clone(),
                ..ListFilter::default()
            },
            ignored_users: config.ignored_users.clone(),
            escalation: config.escalation(),
            launcher,
            browser: BrowserCommand::detect(),
        }
    }
}

/// Console state
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub settings: Settings,
    pub error: Option<ConsoleError>,
    pub focus: Focus,
    pub filter: FilterMode,
    /// Last fetched incident list
    pub incidents: Vec<Incident>,
    /// Rows visible under the current filter
    pub rows: Vec<Incident>,
    pub cursor: Option<usize>,
    pub selected: Option<Incident>,
    pub notes: Vec<Note>,
    pub alerts: Vec<Alert>,
    pub loaded: LoadFlags,
    pub pending: Vec<Pending>,
    pub current_user: Option<User>,
    pub input: InputLine,
    pub status: String,
    pub show_help: bool,
    pub window: (u16, u16),
    pub now: DateTime<Utc>,
    pub should_quit: bool,
}

impl Default for State {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl State {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            error: None,
            focus: Focus::Table,
            filter: FilterMode::default(),
            incidents: Vec::new(),
            rows: Vec::new(),
            cursor: None,
            selected: None,
            notes: Vec::new(),
            alerts: Vec::new(),
            loaded: LoadFlags::default(),
            pending: Vec::new(),
            current_user: None,
            input: InputLine::default(),
            status: String::new(),
            show_help: false,
            window: (80, 24),
            now: Utc::now(),
            should_quit: false,
        }
    }

    /// Error first, then whatever has focus
    pub fn view_mode(&self) -> ViewMode {
        if self.error.is_some() {
            return ViewMode::Error;
        }
        match self.focus {
            Focus::Detail { .. } => ViewMode::IncidentDetail,
            Focus::Input => ViewMode::TextInput,
            Focus::Table => ViewMode::Table,
        }
    }

    pub fn viewing_detail(&self) -> bool {
        matches!(self.focus, Focus::Detail { .. })
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|i| i.id.as_str())
    }

    pub fn is_selected(&self, incident_id: &str) -> bool {
        self.selected_id() == Some(incident_id)
    }

    /// Store a fetched incident as the selection
    ///
    /// Switching to a different incident drops the previous notes and
    /// alerts together with their load flags and anything still waiting on
    /// the previous incident.
    pub fn select_incident(&mut self, incident: Incident) {
        if !self.is_selected(&incident.id) {
            self.abandon_selection();
            self.notes.clear();
            self.alerts.clear();
            self.loaded = LoadFlags::default();
        }
        self.selected = Some(incident);
        self.loaded.detail = true;
    }

    /// Reset the selection and leave the detail view
    pub fn clear_selection(&mut self) {
        self.abandon_selection();
        self.selected = None;
        self.notes.clear();
        self.alerts.clear();
        self.loaded = LoadFlags::default();
        if self.viewing_detail() {
            self.focus = Focus::Table;
        }
    }

    /// The incident under the table cursor
    pub fn highlighted(&self) -> Option<&Incident> {
        self.cursor.and_then(|i| self.rows.get(i))
    }

    fn row_visible(&self, incident: &Incident) -> bool {
        match self.filter {
            FilterMode::Assigned => self
                .current_user
                .as_ref()
                .is_some_and(|user| incident.is_assigned_to(&user.id)),
            FilterMode::Team => {
                let ignored = &self.settings.ignored_users;
                incident.assignments.is_empty()
                    || !incident
                        .assignments
                        .iter()
                        .all(|a| ignored.contains(&a.assignee.id))
            }
        }
    }

    /// Recompute visible rows from the incident list and keep the cursor
    /// on a valid row
    pub fn recompute_rows(&mut self) {
        let highlighted = self.highlighted().map(|i| i.id.clone());
        self.rows = self
            .incidents
            .iter()
            .filter(|incident| self.row_visible(incident))
            .cloned()
            .collect();

        self.cursor = if self.rows.is_empty() {
            None
        } else {
            let same_row = highlighted
                .and_then(|id| self.rows.iter().position(|incident| incident.id == id));
            Some(same_row.unwrap_or_else(|| self.cursor.unwrap_or(0).min(self.rows.len() - 1)))
        };
    }

    /// Drop continuations parked on the current selection
    fn abandon_selection(&mut self) {
        let Some(incident_id) = self.selected.as_ref().map(|i| i.id.clone()) else {
            return;
        };
        let before = self.pending.len();
        self.pending.retain(|p| p.incident_id != incident_id);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            tracing::debug!(
                "Dropped {} action(s) waiting on deselected incident {}",
                dropped,
                incident_id
            );
        }
    }

    /// Drain continuations waiting on `awaiting` for `incident_id`
    pub fn take_pending(&mut self, awaiting: Awaiting, incident_id: &str) -> Vec<Pending> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.awaiting == awaiting && p.incident_id == incident_id);
        self.pending = waiting;
        ready
    }
}

/// "showing X/Y incidents..." with singular wording for exactly 1/1
pub fn list_status(visible: usize, total: usize) -> String {
    let noun = if visible == 1 && total == 1 {
        "incident"
    } else {
        "incidents"
    };
    format!("showing {}/{} {}...", visible, total, noun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagerduty::{Assignment, Reference};

    fn incident(id: &str, assignees: &[&str]) -> Incident {
        Incident {
            id: id.to_string(),
            incident_number: 1,
            title: format!("incident {}", id),
            status: "triggered".to_string(),
            urgency: "high".to_string(),
            created_at: Utc::now(),
            html_url: String::new(),
            service: Reference::default(),
            assignments: assignees
                .iter()
                .map(|a| Assignment {
                    assignee: Reference::new(*a, *a),
                })
                .collect(),
            escalation_policy: Reference::default(),
        }
    }

    #[test]
    fn test_view_mode_precedence() {
        let mut state = State::default();
        assert_eq!(state.view_mode(), ViewMode::Table);

        state.focus = Focus::Input;
        assert_eq!(state.view_mode(), ViewMode::TextInput);

        state.focus = Focus::Detail { scroll: 0 };
        assert_eq!(state.view_mode(), ViewMode::IncidentDetail);

        state.error = Some(ConsoleError::new("fetching incident", "boom"));
        assert_eq!(state.view_mode(), ViewMode::Error);

        state.error = None;
        assert_eq!(state.view_mode(), ViewMode::IncidentDetail);
    }

    #[test]
    fn test_select_different_incident_resets_related_data() {
        let mut state = State::default();
        state.select_incident(incident("Q1", &[]));
        state.loaded.notes = true;
        state.loaded.alerts = true;

        // Same incident again keeps notes/alerts flags
        state.select_incident(incident("Q1", &[]));
        assert_eq!(
            state.loaded,
            LoadFlags {
                detail: true,
                notes: true,
                alerts: true
            }
        );

        state.select_incident(incident("Q2", &[]));
        assert_eq!(
            state.loaded,
            LoadFlags {
                detail: true,
                notes: false,
                alerts: false
            }
        );
    }

    #[test]
    fn test_filter_modes() {
        let mut state = State::new(Settings {
            ignored_users: vec!["PBOT".to_string()],
            ..Settings::default()
        });
        state.current_user = Some(User {
            id: "PME".to_string(),
            name: "Me".to_string(),
            email: "me@example.com".to_string(),
        });
        state.incidents = vec![
            incident("Q1", &["PME"]),
            incident("Q2", &["POTHER"]),
            incident("Q3", &["PBOT"]),
            incident("Q4", &[]),
        ];

        state.recompute_rows();
        let ids: Vec<_> = state.rows.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["Q1"]);

        state.filter = state.filter.toggle();
        state.recompute_rows();
        let ids: Vec<_> = state.rows.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "Q4"]);
    }

    #[test]
    fn test_cursor_follows_highlighted_row() {
        let mut state = State::default();
        state.filter = FilterMode::Team;
        state.incidents = vec![incident("Q1", &[]), incident("Q2", &[]), incident("Q3", &[])];
        state.recompute_rows();
        state.cursor = Some(2);

        state.incidents = vec![incident("Q3", &[]), incident("Q1", &[])];
        state.recompute_rows();
        assert_eq!(state.highlighted().map(|i| i.id.as_str()), Some("Q3"));

        state.incidents.clear();
        state.recompute_rows();
        assert_eq!(state.cursor, None);
    }

    #[test]
    fn test_take_pending_only_matching() {
        let mut state = State::default();
        state.pending = vec![
            Pending {
                incident_id: "Q1".to_string(),
                awaiting: Awaiting::Incident,
                continuation: Continuation::Login,
                tag: "login",
            },
            Pending {
                incident_id: "Q1".to_string(),
                awaiting: Awaiting::Alerts,
                continuation: Continuation::Login,
                tag: "login",
            },
            Pending {
                incident_id: "Q2".to_string(),
                awaiting: Awaiting::Incident,
                continuation: Continuation::AcknowledgeSelected,
                tag: "acknowledge",
            },
        ];

        let ready = state.take_pending(Awaiting::Incident, "Q1");
        assert_eq!(ready.len(), 1);
        assert_eq!(state.pending.len(), 2);
        assert!(state.take_pending(Awaiting::Incident, "Q3").is_empty());
    }

    #[test]
    fn test_deselecting_drops_only_its_waits() {
        let waiting_on = |id: &str| Pending {
            incident_id: id.to_string(),
            awaiting: Awaiting::Alerts,
            continuation: Continuation::Login,
            tag: "login",
        };

        let mut state = State::default();
        state.select_incident(incident("Q1", &[]));
        state.pending = vec![waiting_on("Q1"), waiting_on("Q2")];
        state.clear_selection();
        assert_eq!(state.pending, vec![waiting_on("Q2")]);

        state.select_incident(incident("Q1", &[]));
        state.pending = vec![waiting_on("Q1"), waiting_on("Q2")];
        // Reloading the same incident keeps its waits
        state.select_incident(incident("Q1", &[]));
        assert_eq!(state.pending.len(), 2);
        state.select_incident(incident("Q2", &[]));
        assert_eq!(state.pending, vec![waiting_on("Q2")]);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config {
            teams: vec!["PTEAM".to_string()],
            ignored_users: vec!["PBOT".to_string()],
            ..Config::default()
        };
        config
            .escalation_policies
            .insert("SILENT_DEFAULT".to_string(), "PSILENT".to_string());

        let settings = Settings::from_config(&config);
        assert_eq!(settings.list_filter.team_ids, vec!["PTEAM"]);
        assert_eq!(settings.ignored_users, vec!["PBOT"]);
        assert_eq!(settings.escalation.silent, "PSILENT");
        assert_eq!(settings.escalation.default, "");
        assert!(settings.launcher.is_none());

        config.terminal = vec!["xterm".to_string(), "-e".to_string()];
        config.cluster_login_command = vec![
            "ocm".to_string(),
            "login".to_string(),
            crate::config::CLUSTER_ID_PLACEHOLDER.to_string(),
        ];
        assert!(Settings::from_config(&config).launcher.is_some());
    }

    #[test]
    fn test_list_status_wording() {
        assert_eq!(list_status(1, 1), "showing 1/1 incident...");
        assert_eq!(list_status(1, 2), "showing 1/2 incidents...");
        assert_eq!(list_status(0, 1), "showing 0/1 incidents...");
        assert_eq!(list_status(3, 3), "showing 3/3 incidents...");
    }
}
