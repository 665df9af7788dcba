//! Typed errors for the incident API client

use thiserror::Error;

/// Errors from an `IncidentService`
///
/// Kept `Clone` so results can travel inside console messages; transport
/// errors are flattened to their display text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The note content was blank; nothing was sent
    #[error("incident note is empty")]
    EmptyNote,

    #[error("current user is unknown")]
    NoCurrentUser,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
