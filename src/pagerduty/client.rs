//! PagerDuty REST API v2 client
//!
//! SECURITY: the API token is only ever sent to the configured API base URL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use url::Url;

use super::errors::ClientError;
use super::types::{Alert, Incident, ListFilter, Note, User};

const ACCEPT_HEADER: &str = "application/vnd.pagerduty+json;version=2";
const PAGE_LIMIT: usize = 100;

/// Operations the console needs from the remote incident service
///
/// Implemented by [`PagerDutyClient`] for real use and by in-memory fakes in
/// tests. Every call resolves to a value or a [`ClientError`].
#[async_trait]
pub trait IncidentService: Send + Sync {
    /// The user the API token belongs to
    async fn current_user(&self) -> Result<User, ClientError>;

    /// All open incidents matching the filter (pagination resolved)
    async fn list_incidents(&self, filter: &ListFilter) -> Result<Vec<Incident>, ClientError>;

    async fn get_incident(&self, id: &str) -> Result<Incident, ClientError>;

    async fn get_incident_notes(&self, id: &str) -> Result<Vec<Note>, ClientError>;

    async fn get_incident_alerts(&self, id: &str) -> Result<Vec<Alert>, ClientError>;

    /// Adds a note; blank content yields [`ClientError::EmptyNote`]
    async fn add_note(&self, incident_id: &str, content: &str) -> Result<Note, ClientError>;

    async fn acknowledge_incidents(
        &self,
        incidents: &[Incident],
    ) -> Result<Vec<Incident>, ClientError>;

    async fn reassign_incidents(
        &self,
        incidents: &[Incident],
        users: &[User],
    ) -> Result<Vec<Incident>, ClientError>;

    /// Reassigns incidents to an escalation policy (silence / re-escalate)
    async fn reassign_to_policy(
        &self,
        incidents: &[Incident],
        policy_id: &str,
    ) -> Result<Vec<Incident>, ClientError>;
}

/// Checks note content before it is sent
pub fn validate_note(content: &str) -> Result<&str, ClientError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(ClientError::EmptyNote)
    } else {
        Ok(trimmed)
    }
}

// ========== Wire payloads ==========

#[derive(Debug, Serialize)]
struct TypedReference<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct AssigneeEntry<'a> {
    assignee: TypedReference<'a>,
}

#[derive(Debug, Serialize)]
struct IncidentUpdate<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignments: Option<Vec<AssigneeEntry<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation_policy: Option<TypedReference<'a>>,
}

impl<'a> IncidentUpdate<'a> {
    fn reference(id: &'a str) -> Self {
        Self {
            id,
            kind: "incident_reference",
            status: None,
            assignments: None,
            escalation_policy: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct IncidentsUpdateRequest<'a> {
    incidents: Vec<IncidentUpdate<'a>>,
}

#[derive(Debug, Serialize)]
struct NoteContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct NoteRequest<'a> {
    note: NoteContent<'a>,
}

#[derive(Debug, Deserialize)]
struct IncidentPage {
    #[serde(default)]
    incidents: Vec<Incident>,
    #[serde(default)]
    more: bool,
}

#[derive(Debug, Deserialize)]
struct IncidentEnvelope {
    incident: Incident,
}

#[derive(Debug, Deserialize)]
struct IncidentsEnvelope {
    #[serde(default)]
    incidents: Vec<Incident>,
}

#[derive(Debug, Deserialize)]
struct NotesEnvelope {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct NoteEnvelope {
    note: Note,
}

#[derive(Debug, Deserialize)]
struct AlertsEnvelope {
    #[serde(default)]
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

fn acknowledge_request(incidents: &[Incident]) -> IncidentsUpdateRequest<'_> {
    IncidentsUpdateRequest {
        incidents: incidents
            .iter()
            .map(|incident| IncidentUpdate {
                status: Some("acknowledged"),
                ..IncidentUpdate::reference(&incident.id)
            })
            .collect(),
    }
}

fn reassign_users_request<'a>(
    incidents: &'a [Incident],
    users: &'a [User],
) -> IncidentsUpdateRequest<'a> {
    IncidentsUpdateRequest {
        incidents: incidents
            .iter()
            .map(|incident| IncidentUpdate {
                assignments: Some(
                    users
                        .iter()
                        .map(|user| AssigneeEntry {
                            assignee: TypedReference {
                                id: &user.id,
                                kind: "user_reference",
                            },
                        })
                        .collect(),
                ),
                ..IncidentUpdate::reference(&incident.id)
            })
            .collect(),
    }
}

fn reassign_policy_request<'a>(
    incidents: &'a [Incident],
    policy_id: &'a str,
) -> IncidentsUpdateRequest<'a> {
    IncidentsUpdateRequest {
        incidents: incidents
            .iter()
            .map(|incident| IncidentUpdate {
                escalation_policy: Some(TypedReference {
                    id: policy_id,
                    kind: "escalation_policy_reference",
                }),
                ..IncidentUpdate::reference(&incident.id)
            })
            .collect(),
    }
}

/// reqwest-backed [`IncidentService`]
pub struct PagerDutyClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    current_user: OnceCell<User>,
}

impl PagerDutyClient {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
            current_user: OnceCell::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Token token={}", self.token))
            .header("Accept", ACCEPT_HEADER)
    }

    /// Mutating endpoints require the acting user's email in `From`
    async fn request_as_user(
        &self,
        method: reqwest::Method,
        url: Url,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let user = self.current_user().await?;
        if user.email.is_empty() {
            return Err(ClientError::NoCurrentUser);
        }
        Ok(self.request(method, url).header("From", user.email))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("API error {}: {}", status, message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IncidentService for PagerDutyClient {
    async fn current_user(&self) -> Result<User, ClientError> {
        let user = self
            .current_user
            .get_or_try_init(|| async {
                let url = self.endpoint("users/me")?;
                let envelope: UserEnvelope =
                    self.send(self.request(reqwest::Method::GET, url)).await?;
                tracing::debug!("Resolved current user {}", envelope.user.id);
                Ok::<_, ClientError>(envelope.user)
            })
            .await?;
        Ok(user.clone())
    }

    async fn list_incidents(&self, filter: &ListFilter) -> Result<Vec<Incident>, ClientError> {
        let mut incidents = Vec::new();
        let mut offset = 0;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("limit", PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(filter.statuses.iter().map(|s| ("statuses[]", s.clone())));
            query.extend(filter.team_ids.iter().map(|t| ("team_ids[]", t.clone())));

            let url = self.endpoint("incidents")?;
            let page: IncidentPage = self
                .send(self.request(reqwest::Method::GET, url).query(&query))
                .await?;

            let fetched = page.incidents.len();
            incidents.extend(page.incidents);
            if !page.more || fetched == 0 {
                break;
            }
            offset += fetched;
        }

        tracing::debug!("Listed {} incidents", incidents.len());
        Ok(incidents)
    }

    async fn get_incident(&self, id: &str) -> Result<Incident, ClientError> {
        let url = self.endpoint(&format!("incidents/{}", id))?;
        let envelope: IncidentEnvelope = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.incident)
    }

    async fn get_incident_notes(&self, id: &str) -> Result<Vec<Note>, ClientError> {
        let url = self.endpoint(&format!("incidents/{}/notes", id))?;
        let envelope: NotesEnvelope = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.notes)
    }

    async fn get_incident_alerts(&self, id: &str) -> Result<Vec<Alert>, ClientError> {
        let url = self.endpoint(&format!("incidents/{}/alerts", id))?;
        let envelope: AlertsEnvelope = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.alerts)
    }

    async fn add_note(&self, incident_id: &str, content: &str) -> Result<Note, ClientError> {
        let content = validate_note(content)?;
        let url = self.endpoint(&format!("incidents/{}/notes", incident_id))?;
        let builder = self
            .request_as_user(reqwest::Method::POST, url)
            .await?
            .json(&NoteRequest {
                note: NoteContent { content },
            });
        let envelope: NoteEnvelope = self.send(builder).await?;
        Ok(envelope.note)
    }

    async fn acknowledge_incidents(
        &self,
        incidents: &[Incident],
    ) -> Result<Vec<Incident>, ClientError> {
        let url = self.endpoint("incidents")?;
        let builder = self
            .request_as_user(reqwest::Method::PUT, url)
            .await?
            .json(&acknowledge_request(incidents));
        let envelope: IncidentsEnvelope = self.send(builder).await?;
        Ok(envelope.incidents)
    }

    async fn reassign_incidents(
        &self,
        incidents: &[Incident],
        users: &[User],
    ) -> Result<Vec<Incident>, ClientError> {
        let url = self.endpoint("incidents")?;
        let builder = self
            .request_as_user(reqwest::Method::PUT, url)
            .await?
            .json(&reassign_users_request(incidents, users));
        let envelope: IncidentsEnvelope = self.send(builder).await?;
        Ok(envelope.incidents)
    }

    async fn reassign_to_policy(
        &self,
        incidents: &[Incident],
        policy_id: &str,
    ) -> Result<Vec<Incident>, ClientError> {
        let url = self.endpoint("incidents")?;
        let builder = self
            .request_as_user(reqwest::Method::PUT, url)
            .await?
            .json(&reassign_policy_request(incidents, policy_id));
        let envelope: IncidentsEnvelope = self.send(builder).await?;
        Ok(envelope.incidents)
    }
}
