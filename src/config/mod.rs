//! Configuration management for triage

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder substituted with the cluster id in `cluster_login_command`
pub const CLUSTER_ID_PLACEHOLDER: &str = "%%CLUSTER_ID%%";

/// Escalation policy key used when re-escalating an incident
pub const DEFAULT_POLICY_KEY: &str = "DEFAULT";

/// Escalation policy key used when silencing an incident
pub const SILENT_POLICY_KEY: &str = "SILENT_DEFAULT";

/// Environment variable that overrides `token`
pub const TOKEN_ENV: &str = "TRIAGE_TOKEN";

const DEFAULT_API_URL: &str = "https://api.pagerduty.com/";

/// Configuration validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no API token configured (set `token` or {})", TOKEN_ENV)]
    MissingToken,

    #[error("invalid api_url {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("escalation_policies must contain a `{0}` entry")]
    MissingEscalationPolicy(&'static str),

    #[error("cluster_login_command must contain the {} placeholder", CLUSTER_ID_PLACEHOLDER)]
    MissingPlaceholder,

    #[error("`terminal` must not be empty when cluster_login_command is set")]
    MissingTerminal,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API token (overridden by TRIAGE_TOKEN)
    pub token: String,
    /// Base URL of the incident API
    pub api_url: String,
    /// Team ids used to filter the incident list
    pub teams: Vec<String>,
    /// Escalation policy ids keyed by `DEFAULT` / `SILENT_DEFAULT`
    pub escalation_policies: HashMap<String, String>,
    /// User ids whose incidents are hidden from the team view
    pub ignored_users: Vec<String>,
    /// Editor argv; falls back to $EDITOR, then `vi`
    pub editor: Vec<String>,
    /// Terminal argv the login command is launched in
    pub terminal: Vec<String>,
    /// Cluster login argv containing the cluster id placeholder
    pub cluster_login_command: Vec<String>,
    /// Incident list polling interval
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            teams: Vec::new(),
            escalation_policies: HashMap::new(),
            ignored_users: Vec::new(),
            editor: Vec::new(),
            terminal: Vec::new(),
            cluster_login_command: Vec::new(),
            poll_interval_secs: 15,
        }
    }
}

impl Config {
    /// Load configuration from `path` or the default location
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let config_path = Self::config_path()?;
                if config_path.exists() {
                    Self::from_file(&config_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                config.token = token;
            }
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "triage") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Validate the keys the console cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        self.api_url()?;

        for key in [DEFAULT_POLICY_KEY, SILENT_POLICY_KEY] {
            if !self.escalation_policies.contains_key(key) {
                return Err(ConfigError::MissingEscalationPolicy(key));
            }
        }

        if !self.cluster_login_command.is_empty() {
            if !self
                .cluster_login_command
                .iter()
                .any(|arg| arg.contains(CLUSTER_ID_PLACEHOLDER))
            {
                return Err(ConfigError::MissingPlaceholder);
            }
            if self.terminal.is_empty() {
                return Err(ConfigError::MissingTerminal);
            }
        }

        Ok(())
    }

    /// Parsed API base URL (always ends with `/` so relative joins work)
    pub fn api_url(&self) -> Result<url::Url, ConfigError> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        url::Url::parse(&raw).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Editor argv with the $EDITOR / `vi` fallbacks applied
    pub fn editor_command(&self) -> Vec<String> {
        if !self.editor.is_empty() {
            return self.editor.clone();
        }
        std::env::var("EDITOR")
            .ok()
            .map(|e| e.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(|| vec!["vi".to_string()])
    }

    pub fn escalation(&self) -> EscalationPolicies {
        EscalationPolicies {
            default: self
                .escalation_policies
                .get(DEFAULT_POLICY_KEY)
                .cloned()
                .unwrap_or_default(),
            silent: self
                .escalation_policies
                .get(SILENT_POLICY_KEY)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Escalation policy ids used by re-escalate and silence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationPolicies {
    pub default: String,
    pub silent: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid() -> Config {
        let mut config = Config {
            token: "secret".to_string(),
            terminal: vec!["xterm".to_string(), "-e".to_string()],
            cluster_login_command: vec![
                "ocm".to_string(),
                "backplane".to_string(),
                "login".to_string(),
                CLUSTER_ID_PLACEHOLDER.to_string(),
            ],
            ..Config::default()
        };
        config
            .escalation_policies
            .insert(DEFAULT_POLICY_KEY.to_string(), "PDEF".to_string());
        config
            .escalation_policies
            .insert(SILENT_POLICY_KEY.to_string(), "PSIL".to_string());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_missing_token_rejected() {
        let config = Config {
            token: "  ".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingToken));
    }

    #[test]
    fn test_missing_escalation_entries_rejected() {
        let mut config = valid();
        config.escalation_policies.remove(SILENT_POLICY_KEY);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingEscalationPolicy(SILENT_POLICY_KEY))
        );

        config.escalation_policies.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingEscalationPolicy(DEFAULT_POLICY_KEY))
        );
    }

    #[test]
    fn test_login_command_requires_placeholder() {
        let config = Config {
            cluster_login_command: vec!["ocm".to_string(), "login".to_string()],
            ..valid()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingPlaceholder));
    }

    #[test]
    fn test_login_command_requires_terminal() {
        let config = Config {
            terminal: Vec::new(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingTerminal));
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let config = Config {
            api_url: "https://api.example.com/v2".to_string(),
            ..valid()
        };
        assert_eq!(
            config.api_url().unwrap().as_str(),
            "https://api.example.com/v2/"
        );

        let config = Config {
            api_url: "not a url".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
token = "from-file"
teams = ["PTEAM"]
ignored_users = ["PBOT"]
editor = ["nvim"]

[escalation_policies]
DEFAULT = "PDEF"
SILENT_DEFAULT = "PSIL"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        if std::env::var(TOKEN_ENV).is_err() {
            assert_eq!(config.token, "from-file");
        }
        assert_eq!(config.teams, vec!["PTEAM".to_string()]);
        assert_eq!(config.editor_command(), vec!["nvim".to_string()]);
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(
            config.escalation(),
            EscalationPolicies {
                default: "PDEF".to_string(),
                silent: "PSIL".to_string(),
            }
        );
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
