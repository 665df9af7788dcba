//! OS-specific "open URL" command, resolved once at startup

/// The platform command used to open a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCommand {
    argv: Vec<String>,
}

impl BrowserCommand {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// The opener for the current platform, if there is one
    pub fn detect() -> Option<Self> {
        let argv: &[&str] = if cfg!(target_os = "macos") {
            &["open"]
        } else if cfg!(target_os = "windows") {
            &["cmd", "/c", "start", ""]
        } else if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        )) {
            &["xdg-open"]
        } else {
            return None;
        };
        Some(Self::new(argv.iter().map(|s| s.to_string()).collect()))
    }

    /// Full argv for opening `url`
    pub fn command_for(&self, url: &str) -> Vec<String> {
        let mut argv = self.argv.clone();
        argv.push(url.to_string());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_appends_url() {
        let opener = BrowserCommand::new(vec!["xdg-open".to_string()]);
        assert_eq!(
            opener.command_for("https://example.com/incidents/Q1"),
            vec!["xdg-open", "https://example.com/incidents/Q1"]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_detect_on_linux() {
        assert_eq!(
            BrowserCommand::detect(),
            Some(BrowserCommand::new(vec!["xdg-open".to_string()]))
        );
    }
}
