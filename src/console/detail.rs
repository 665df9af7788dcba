//! Detail view text
//!
//! The incident detail viewport is plain text built from [`State`]; the
//! renderer only wraps it in a scrolling paragraph.

use chrono::{DateTime, Utc};

use super::state::State;
use crate::pagerduty::Incident;

pub const LOADING_DETAILS: &str = "Loading incident details, please wait...";
pub const LOADING_NOTES: &str = "Loading notes...";
pub const LOADING_ALERTS: &str = "Loading alerts...";

/// Rows taken by the status line, help line and the viewport border
const DETAIL_CHROME_ROWS: u16 = 4;

/// Height of the detail viewport for a terminal `window_height` rows tall
pub fn viewport_height(window_height: u16) -> u16 {
    window_height.saturating_sub(DETAIL_CHROME_ROWS)
}

/// Largest useful scroll offset for the current detail text
pub fn max_scroll(state: &State) -> u16 {
    let lines = incident_detail_text(state).lines().count();
    let lines = u16::try_from(lines).unwrap_or(u16::MAX);
    lines.saturating_sub(viewport_height(state.window.1))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn header(incident: &Incident) -> Vec<String> {
    vec![
        format!(
            "[#{}] {}  ({})",
            incident.incident_number, incident.title, incident.id
        ),
        format!("Status:    {} ({})", incident.status, incident.urgency),
        format!("Service:   {}", incident.service.summary),
        format!("Assigned:  {}", incident.assignee_names()),
        format!("Policy:    {}", incident.escalation_policy.summary),
        format!("Created:   {}", timestamp(&incident.created_at)),
        format!("URL:       {}", incident.html_url),
    ]
}

/// Text shown in the detail viewport
///
/// Notes and alerts show a loading placeholder until their fetch lands.
pub fn incident_detail_text(state: &State) -> String {
    let Some(incident) = &state.selected else {
        return "No incident selected".to_string();
    };
    if !state.loaded.detail {
        return LOADING_DETAILS.to_string();
    }

    let mut lines = header(incident);

    lines.push(String::new());
    lines.push(format!("Notes ({})", state.notes.len()));
    if !state.loaded.notes {
        lines.push(format!("  {}", LOADING_NOTES));
    } else if state.notes.is_empty() {
        lines.push("  (no notes)".to_string());
    } else {
        for note in &state.notes {
            lines.push(format!(
                "  - {} {}:",
                timestamp(&note.created_at),
                note.user.summary
            ));
            lines.extend(note.content.lines().map(|line| format!("      {}", line)));
        }
    }

    lines.push(String::new());
    lines.push(format!("Alerts ({})", state.alerts.len()));
    if !state.loaded.alerts {
        lines.push(format!("  {}", LOADING_ALERTS));
    } else if state.alerts.is_empty() {
        lines.push("  (no alerts)".to_string());
    } else {
        for alert in &state.alerts {
            let cluster = alert
                .cluster_id()
                .map(|id| format!(" [cluster {}]", id))
                .unwrap_or_default();
            lines.push(format!("  - [{}] {}{}", alert.status, alert.summary, cluster));
        }
    }

    lines.join("\n")
}
