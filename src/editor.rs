//! External editor for writing incident notes
//!
//! The draft is seeded from a template, handed to the configured editor in a
//! temp file, and read back once the editor exits. Lines starting with `#`
//! are instructions and are stripped from the result.

use std::io::Write;
use thiserror::Error;

use crate::pagerduty::Incident;

/// Errors from the note editor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("no editor configured")]
    NoEditor,

    #[error("failed to prepare note draft: {0}")]
    Draft(String),

    #[error("failed to run editor {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("editor {program} exited with {status}")]
    Failed { program: String, status: String },
}

/// A request to edit a note for one incident
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub incident_id: String,
    pub template: String,
}

impl EditRequest {
    pub fn for_incident(incident: &Incident) -> Self {
        Self {
            incident_id: incident.id.clone(),
            template: note_template(incident),
        }
    }
}

/// Initial draft shown in the editor
pub fn note_template(incident: &Incident) -> String {
    format!(
        "\n\
         # Note for incident {} (#{})\n\
         # {}\n\
         # Service: {}\n\
         #\n\
         # Lines starting with '#' are ignored. An empty note is not added.\n",
        incident.id, incident.incident_number, incident.title, incident.service.summary
    )
}

/// Drops comment lines and surrounding blank space
pub fn strip_comments(draft: &str) -> String {
    draft
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Blocking note editor
pub trait NoteEditor: Send + Sync {
    /// Runs the editor until it exits and returns the edited note
    fn edit(&self, request: &EditRequest) -> Result<String, EditorError>;
}

/// Runs the configured editor argv with the draft path appended
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    argv: Vec<String>,
}

impl ExternalEditor {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl NoteEditor for ExternalEditor {
    fn edit(&self, request: &EditRequest) -> Result<String, EditorError> {
        let (program, args) = self.argv.split_first().ok_or(EditorError::NoEditor)?;

        let mut draft = tempfile::Builder::new()
            .prefix(&format!("triage-note-{}-", request.incident_id))
            .suffix(".md")
            .tempfile()
            .map_err(|e| EditorError::Draft(e.to_string()))?;
        draft
            .write_all(request.template.as_bytes())
            .and_then(|_| draft.flush())
            .map_err(|e| EditorError::Draft(e.to_string()))?;

        tracing::info!("Opening {} for incident {}", program, request.incident_id);
        let status = std::process::Command::new(program)
            .args(args)
            .arg(draft.path())
            .status()
            .map_err(|e| EditorError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(EditorError::Failed {
                program: program.clone(),
                status: status.to_string(),
            });
        }

        let content =
            std::fs::read_to_string(draft.path()).map_err(|e| EditorError::Draft(e.to_string()))?;
        Ok(strip_comments(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagerduty::Reference;
    use chrono::Utc;

    fn incident() -> Incident {
        Incident {
            id: "Q123".to_string(),
            incident_number: 7,
            title: "API latency".to_string(),
            status: "triggered".to_string(),
            urgency: "high".to_string(),
            created_at: Utc::now(),
            html_url: String::new(),
            service: Reference::new("PSVC", "gateway"),
            assignments: Vec::new(),
            escalation_policy: Reference::default(),
        }
    }

    #[test]
    fn test_template_is_all_comments() {
        let template = note_template(&incident());
        assert!(template.contains("Q123"));
        assert!(template.contains("API latency"));
        assert_eq!(strip_comments(&template), "");
    }

    #[test]
    fn test_strip_comments_keeps_note_body() {
        let draft = "Restarted the gateway pods.\n# ignored\n  # also ignored\nLatency back to normal.\n\n";
        assert_eq!(
            strip_comments(draft),
            "Restarted the gateway pods.\nLatency back to normal."
        );
    }

    #[test]
    fn test_empty_argv_is_rejected() {
        let editor = ExternalEditor::new(Vec::new());
        assert_eq!(
            editor.edit(&EditRequest::for_incident(&incident())),
            Err(EditorError::NoEditor)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_editor_output_is_read_back() {
        // `sh -c 'echo ... >> "$0"'` appends to the draft path passed as $0
        let editor = ExternalEditor::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'checked dashboards' >> \"$0\"".to_string(),
        ]);

        let note = editor.edit(&EditRequest::for_incident(&incident())).unwrap();
        assert_eq!(note, "checked dashboards");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_is_reported() {
        let editor = ExternalEditor::new(vec!["false".to_string()]);
        assert!(matches!(
            editor.edit(&EditRequest::for_incident(&incident())),
            Err(EditorError::Failed { .. })
        ));
    }
}
