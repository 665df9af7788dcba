//! Incident domain types
//!
//! These mirror the PagerDuty REST API v2 wire format closely enough to be
//! deserialized directly from responses, keeping only the fields the console
//! reads.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A reference to another API object (service, user, escalation policy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Reference {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
        }
    }
}

/// A single assignee entry on an incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignee: Reference,
}

/// An incident as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(default)]
    pub incident_number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub urgency: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub service: Reference,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub escalation_policy: Reference,
}

impl Incident {
    /// Whether the given user id is one of the incident's assignees
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignments.iter().any(|a| a.assignee.id == user_id)
    }

    /// Comma-separated assignee names
    pub fn assignee_names(&self) -> String {
        self.assignments
            .iter()
            .map(|a| a.assignee.summary.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A free-text note attached to an incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Reference,
}

/// Structured alert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertBody {
    #[serde(default)]
    pub details: serde_json::Value,
}

/// A lower-level event attached to an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub body: Option<AlertBody>,
}

impl Alert {
    /// Looks up a string detail field by key
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.details.get(key))
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Cluster the alert fired on
    ///
    /// Prefers the `cluster_id` detail field and falls back to a
    /// `cluster_id: <id>` mention in the summary.
    pub fn cluster_id(&self) -> Option<String> {
        if let Some(id) = self.detail("cluster_id") {
            return Some(id.to_string());
        }

        static SUMMARY_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = SUMMARY_PATTERN
            .get_or_init(|| Regex::new(r"cluster[_ ]id[:=]\s*([A-Za-z0-9][A-Za-z0-9-]*)").ok())
            .as_ref()?;
        pattern
            .captures(&self.summary)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    pub fn reference(&self) -> Reference {
        Reference::new(self.id.clone(), self.name.clone())
    }
}

/// Filter passed to `list_incidents`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub team_ids: Vec<String>,
    pub statuses: Vec<String>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            team_ids: Vec::new(),
            statuses: vec!["triggered".to_string(), "acknowledged".to_string()],
        }
    }
}
