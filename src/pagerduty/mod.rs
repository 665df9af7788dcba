//! Remote incident service
//!
//! The [`IncidentService`] trait is the seam between the console and the
//! incident API; [`PagerDutyClient`] is the HTTP implementation.

mod client;
mod errors;
mod types;

pub use client::{validate_note, IncidentService, PagerDutyClient};
pub use errors::ClientError;
pub use types::{Alert, AlertBody, Assignment, Incident, ListFilter, Note, Reference, User};
