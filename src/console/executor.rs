//! Command executor
//!
//! Every background [`Cmd`] runs on its own tokio task. The message a
//! command resolves to is sent back to the console over an unbounded
//! channel, so results arrive in completion order.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::mpsc;

use super::command::Cmd;
use super::message::Msg;
use crate::launcher::ProcessSpawner;
use crate::pagerduty::IncidentService;

/// Runs commands against the incident service and the process spawner
#[derive(Clone)]
pub struct Executor {
    service: Arc<dyn IncidentService>,
    spawner: Arc<dyn ProcessSpawner>,
    tx: mpsc::UnboundedSender<Msg>,
}

impl Executor {
    pub fn new(
        service: Arc<dyn IncidentService>,
        spawner: Arc<dyn ProcessSpawner>,
        tx: mpsc::UnboundedSender<Msg>,
    ) -> Self {
        Self {
            service,
            spawner,
            tx,
        }
    }

    /// Start `cmd` in the background
    ///
    /// Batch children each get their own task; a sequence runs on one task
    /// so its results are delivered in order.
    pub fn spawn(&self, cmd: Cmd) {
        match cmd {
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.spawn(cmd);
                }
            }
            Cmd::Emit(msg) => self.send(msg),
            cmd => {
                let executor = self.clone();
                tokio::spawn(async move {
                    executor.run(cmd).await;
                });
            }
        }
    }

    fn send(&self, msg: Msg) {
        if self.tx.send(msg).is_err() {
            tracing::debug!("Console closed, dropping message");
        }
    }

    /// Run `cmd` to completion on the current task
    pub fn run(&self, cmd: Cmd) -> BoxFuture<'_, ()> {
        async move {
            match cmd {
                Cmd::Batch(cmds) => {
                    future::join_all(cmds.into_iter().map(|cmd| self.run(cmd))).await;
                }
                Cmd::Sequence(cmds) => {
                    for cmd in cmds {
                        self.run(cmd).await;
                    }
                }
                cmd => {
                    if let Some(msg) = self.resolve(cmd).await {
                        self.send(msg);
                    }
                }
            }
        }
        .boxed()
    }

    /// The message a single command resolves to
    async fn resolve(&self, cmd: Cmd) -> Option<Msg> {
        tracing::debug!("Running command {}", cmd.label());
        let service = &self.service;

        let msg = match cmd {
            Cmd::Emit(msg) => msg,
            Cmd::FetchCurrentUser => Msg::GotCurrentUser(service.current_user().await),
            Cmd::FetchIncidentList(filter) => {
                Msg::GotIncidentList(service.list_incidents(&filter).await)
            }
            Cmd::FetchIncident(incident_id) => Msg::GotIncident {
                result: service.get_incident(&incident_id).await,
                incident_id,
            },
            Cmd::FetchIncidentNotes(incident_id) => Msg::GotIncidentNotes {
                result: service.get_incident_notes(&incident_id).await,
                incident_id,
            },
            Cmd::FetchIncidentAlerts(incident_id) => Msg::GotIncidentAlerts {
                result: service.get_incident_alerts(&incident_id).await,
                incident_id,
            },
            Cmd::AddNote {
                incident_id,
                content,
            } => Msg::NoteAdded(service.add_note(&incident_id, &content).await),
            Cmd::Acknowledge(incidents) => {
                Msg::Acknowledged(service.acknowledge_incidents(&incidents).await)
            }
            Cmd::ReassignToUsers { incidents, users } => Msg::Reassigned {
                verb: "reassigned",
                result: service.reassign_incidents(&incidents, &users).await,
            },
            Cmd::ReassignToPolicy {
                incidents,
                policy_id,
                verb,
            } => Msg::Reassigned {
                verb,
                result: service.reassign_to_policy(&incidents, &policy_id).await,
            },
            Cmd::Login { argv } => Msg::LoginFinished(self.spawner.spawn_detached(&argv).await),
            Cmd::OpenBrowser { argv } => Msg::BrowserOpened(self.spawner.run(&argv).await),
            Cmd::OpenEditor(request) => {
                tracing::warn!(
                    "Editor for incident {} needs the terminal, not starting it in the background",
                    request.incident_id
                );
                return None;
            }
            nested @ (Cmd::Batch(_) | Cmd::Sequence(_)) => {
                self.run(nested).await;
                return None;
            }
        };
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::LaunchError;
    use crate::pagerduty::{Alert, ClientError, Incident, ListFilter, Note, User};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and answers every request with an API error
    #[derive(Default)]
    struct FailingService {
        calls: Mutex<Vec<String>>,
    }

    impl FailingService {
        fn record(&self, call: String) -> ClientError {
            self.calls.lock().unwrap().push(call);
            ClientError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }
        }
    }

    #[async_trait]
    impl IncidentService for FailingService {
        async fn current_user(&self) -> Result<User, ClientError> {
            Err(self.record("current_user".to_string()))
        }
        async fn list_incidents(&self, _: &ListFilter) -> Result<Vec<Incident>, ClientError> {
            Err(self.record("list_incidents".to_string()))
        }
        async fn get_incident(&self, id: &str) -> Result<Incident, ClientError> {
            Err(self.record(format!("get_incident {}", id)))
        }
        async fn get_incident_notes(&self, id: &str) -> Result<Vec<Note>, ClientError> {
            Err(self.record(format!("get_incident_notes {}", id)))
        }
        async fn get_incident_alerts(&self, id: &str) -> Result<Vec<Alert>, ClientError> {
            Err(self.record(format!("get_incident_alerts {}", id)))
        }
        async fn add_note(&self, id: &str, _: &str) -> Result<Note, ClientError> {
            Err(self.record(format!("add_note {}", id)))
        }
        async fn acknowledge_incidents(
            &self,
            incidents: &[Incident],
        ) -> Result<Vec<Incident>, ClientError> {
            Err(self.record(format!("acknowledge {}", incidents.len())))
        }
        async fn reassign_incidents(
            &self,
            incidents: &[Incident],
            _: &[User],
        ) -> Result<Vec<Incident>, ClientError> {
            Err(self.record(format!("reassign {}", incidents.len())))
        }
        async fn reassign_to_policy(
            &self,
            _: &[Incident],
            policy_id: &str,
        ) -> Result<Vec<Incident>, ClientError> {
            Err(self.record(format!("reassign_to_policy {}", policy_id)))
        }
    }

    #[derive(Default)]
    struct RecordingSpawner {
        spawned: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl ProcessSpawner for RecordingSpawner {
        async fn spawn_detached(&self, argv: &[String]) -> Result<(), LaunchError> {
            self.spawned.lock().unwrap().push(argv.to_vec());
            Ok(())
        }
        async fn run(&self, argv: &[String]) -> Result<(), LaunchError> {
            self.spawned.lock().unwrap().push(argv.to_vec());
            Ok(())
        }
    }

    fn executor() -> (
        Executor,
        Arc<FailingService>,
        Arc<RecordingSpawner>,
        mpsc::UnboundedReceiver<Msg>,
    ) {
        let service = Arc::new(FailingService::default());
        let spawner = Arc::new(RecordingSpawner::default());
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Executor::new(service.clone(), spawner.clone(), tx),
            service,
            spawner,
            rx,
        )
    }

    #[tokio::test]
    async fn test_sequence_delivers_in_order() {
        let (executor, service, _, mut rx) = executor();
        executor
            .run(Cmd::Sequence(vec![
                Cmd::FetchIncident("Q1".to_string()),
                Cmd::Emit(Msg::ClearSelection),
                Cmd::Emit(Msg::RefreshIncidentList),
            ]))
            .await;

        assert!(matches!(
            rx.recv().await,
            Some(Msg::GotIncident { ref incident_id, result: Err(_) }) if incident_id == "Q1"
        ));
        assert_eq!(rx.recv().await, Some(Msg::ClearSelection));
        assert_eq!(rx.recv().await, Some(Msg::RefreshIncidentList));
        assert_eq!(*service.calls.lock().unwrap(), vec!["get_incident Q1"]);
    }

    #[tokio::test]
    async fn test_batch_runs_every_child() {
        let (executor, service, _, mut rx) = executor();
        executor.spawn(Cmd::Batch(vec![
            Cmd::FetchIncidentNotes("Q1".to_string()),
            Cmd::FetchIncidentAlerts("Q1".to_string()),
        ]));

        let mut received = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        received.sort_by_key(|msg| matches!(msg, Msg::GotIncidentAlerts { .. }));
        assert!(matches!(received[0], Msg::GotIncidentNotes { .. }));
        assert!(matches!(received[1], Msg::GotIncidentAlerts { .. }));
        assert_eq!(service.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_policy_reassign_keeps_verb() {
        let (executor, service, _, mut rx) = executor();
        executor
            .run(Cmd::ReassignToPolicy {
                incidents: Vec::new(),
                policy_id: "PSILENT".to_string(),
                verb: "silenced",
            })
            .await;

        assert!(matches!(
            rx.recv().await,
            Some(Msg::Reassigned { verb: "silenced", result: Err(_) })
        ));
        assert_eq!(
            *service.calls.lock().unwrap(),
            vec!["reassign_to_policy PSILENT"]
        );
    }

    #[tokio::test]
    async fn test_login_and_browser_use_spawner() {
        let (executor, _, spawner, mut rx) = executor();
        executor
            .run(Cmd::Login {
                argv: vec!["xterm".to_string(), "-e".to_string(), "ocm".to_string()],
            })
            .await;
        executor
            .run(Cmd::OpenBrowser {
                argv: vec!["xdg-open".to_string(), "https://example.com".to_string()],
            })
            .await;

        assert_eq!(rx.recv().await, Some(Msg::LoginFinished(Ok(()))));
        assert_eq!(rx.recv().await, Some(Msg::BrowserOpened(Ok(()))));
        assert_eq!(spawner.spawned.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_emit_is_delivered_without_a_task() {
        let (executor, _, _, mut rx) = executor();
        executor.spawn(Cmd::Emit(Msg::PollIncidents));
        assert_eq!(rx.try_recv().ok(), Some(Msg::PollIncidents));
    }
}
