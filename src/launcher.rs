//! Cluster login launcher and process spawning
//!
//! The launcher turns a cluster id into the argv for a terminal running the
//! configured login command. Spawning is behind [`ProcessSpawner`] so the
//! console can be driven without starting real processes.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, CLUSTER_ID_PLACEHOLDER};

/// Errors from building or running external commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("no terminal configured")]
    NoTerminal,

    #[error("no cluster login command configured")]
    NoLoginCommand,

    #[error("cluster login command is missing the {} placeholder", CLUSTER_ID_PLACEHOLDER)]
    MissingPlaceholder,

    #[error("empty command")]
    EmptyCommand,

    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
}

/// Builds cluster login commands from the configured templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLauncher {
    terminal: Vec<String>,
    login_command: Vec<String>,
}

impl ClusterLauncher {
    pub fn new(terminal: Vec<String>, login_command: Vec<String>) -> Self {
        Self {
            terminal,
            login_command,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.terminal.clone(), config.cluster_login_command.clone())
    }

    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.terminal.is_empty() {
            return Err(LaunchError::NoTerminal);
        }
        if self.login_command.is_empty() {
            return Err(LaunchError::NoLoginCommand);
        }
        if !self
            .login_command
            .iter()
            .any(|arg| arg.contains(CLUSTER_ID_PLACEHOLDER))
        {
            return Err(LaunchError::MissingPlaceholder);
        }
        Ok(())
    }

    /// Terminal argv followed by the login argv with every placeholder
    /// replaced by `cluster_id`
    pub fn build_login_command(&self, cluster_id: &str) -> Vec<String> {
        self.terminal
            .iter()
            .cloned()
            .chain(
                self.login_command
                    .iter()
                    .map(|arg| arg.replace(CLUSTER_ID_PLACEHOLDER, cluster_id)),
            )
            .collect()
    }
}

/// Starts external processes on behalf of console commands
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Start the process and return without waiting for it
    async fn spawn_detached(&self, argv: &[String]) -> Result<(), LaunchError>;

    /// Run the process to completion, failing on a non-zero exit
    async fn run(&self, argv: &[String]) -> Result<(), LaunchError>;
}

/// [`ProcessSpawner`] backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

fn split_argv(argv: &[String]) -> Result<(&String, &[String]), LaunchError> {
    argv.split_first().ok_or(LaunchError::EmptyCommand)
}

#[async_trait]
impl ProcessSpawner for SystemSpawner {
    async fn spawn_detached(&self, argv: &[String]) -> Result<(), LaunchError> {
        let (program, args) = split_argv(argv)?;
        tracing::info!("Launching {} {:?}", program, args);

        tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|e| LaunchError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })
    }

    async fn run(&self, argv: &[String]) -> Result<(), LaunchError> {
        let (program, args) = split_argv(argv)?;
        tracing::debug!("Running {} {:?}", program, args);

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| LaunchError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LaunchError::Failed {
                program: program.clone(),
                status: output.status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_login_command_substitutes_every_placeholder() {
        let launcher = ClusterLauncher::new(
            strings(&["gnome-terminal", "--"]),
            strings(&["ocm", "login", "%%CLUSTER_ID%%", "--name=%%CLUSTER_ID%%-admin"]),
        );

        assert_eq!(
            launcher.build_login_command("c-42"),
            strings(&["gnome-terminal", "--", "ocm", "login", "c-42", "--name=c-42-admin"])
        );
    }

    #[test]
    fn test_validate() {
        let ok = ClusterLauncher::new(strings(&["xterm", "-e"]), strings(&["login", "%%CLUSTER_ID%%"]));
        assert_eq!(ok.validate(), Ok(()));

        let no_terminal = ClusterLauncher::new(Vec::new(), strings(&["login", "%%CLUSTER_ID%%"]));
        assert_eq!(no_terminal.validate(), Err(LaunchError::NoTerminal));

        let no_login = ClusterLauncher::new(strings(&["xterm"]), Vec::new());
        assert_eq!(no_login.validate(), Err(LaunchError::NoLoginCommand));

        let no_placeholder = ClusterLauncher::new(strings(&["xterm"]), strings(&["login"]));
        assert_eq!(no_placeholder.validate(), Err(LaunchError::MissingPlaceholder));
    }

    #[tokio::test]
    async fn test_system_spawner_rejects_empty_argv() {
        let spawner = SystemSpawner;
        assert_eq!(spawner.run(&[]).await, Err(LaunchError::EmptyCommand));
        assert_eq!(
            spawner.spawn_detached(&[]).await,
            Err(LaunchError::EmptyCommand)
        );
    }
}
