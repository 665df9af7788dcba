//! Key bindings per view mode
//!
//! One static table per mode maps key names to actions and carries the help
//! text shown in the footer, so the help can never drift from what the
//! dispatcher actually accepts.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::ViewMode;

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Help,
    // Navigation
    Up,
    Down,
    Top,
    Bottom,
    // Focus changes
    View,
    Back,
    FocusInput,
    Submit,
    // Incident actions
    Acknowledge,
    Silence,
    ReEscalate,
    Take,
    Note,
    Login,
    Open,
    Refresh,
    ToggleTeam,
}

/// One row of a binding table
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub action: Action,
    /// Key names as produced by [`key_name`]
    pub keys: &'static [&'static str],
    /// Keys as shown in the help footer
    pub help_key: &'static str,
    pub help: &'static str,
}

const fn bind(
    action: Action,
    keys: &'static [&'static str],
    help_key: &'static str,
    help: &'static str,
) -> Binding {
    Binding {
        action,
        keys,
        help_key,
        help,
    }
}

pub const TABLE_BINDINGS: &[Binding] = &[
    bind(Action::Up, &["up", "k"], "↑/k", "up"),
    bind(Action::Down, &["down", "j"], "↓/j", "down"),
    bind(Action::Top, &["home", "g"], "home/g", "top"),
    bind(Action::Bottom, &["end", "G"], "end/G", "bottom"),
    bind(Action::View, &["enter"], "enter", "view"),
    bind(Action::Acknowledge, &["a"], "a", "acknowledge"),
    bind(Action::Silence, &["ctrl+s"], "ctrl+s", "silence"),
    bind(Action::ReEscalate, &["e"], "e", "re-escalate"),
    bind(Action::Take, &["t"], "t", "take"),
    bind(Action::Note, &["n"], "n", "add note"),
    bind(Action::Login, &["l"], "l", "cluster login"),
    bind(Action::Open, &["o"], "o", "open in browser"),
    bind(Action::Refresh, &["r"], "r", "refresh"),
    bind(Action::ToggleTeam, &["T"], "T", "team/mine"),
    bind(Action::FocusInput, &[":"], ":", "input"),
    bind(Action::Help, &["?"], "?", "help"),
    bind(Action::Quit, &["q", "ctrl+c"], "q/ctrl+c", "quit"),
];

pub const DETAIL_BINDINGS: &[Binding] = &[
    bind(Action::Back, &["esc"], "esc", "back"),
    bind(Action::Acknowledge, &["a"], "a", "acknowledge"),
    bind(Action::Silence, &["ctrl+s"], "ctrl+s", "silence"),
    bind(Action::ReEscalate, &["e"], "e", "re-escalate"),
    bind(Action::Take, &["t"], "t", "take"),
    bind(Action::Note, &["n"], "n", "add note"),
    bind(Action::Login, &["l"], "l", "cluster login"),
    bind(Action::Open, &["o"], "o", "open in browser"),
    bind(Action::Refresh, &["r"], "r", "refresh"),
    bind(Action::Help, &["?"], "?", "help"),
    bind(Action::Quit, &["ctrl+c"], "ctrl+c", "quit"),
];

pub const INPUT_BINDINGS: &[Binding] = &[
    bind(Action::Back, &["esc"], "esc", "back"),
    bind(Action::Submit, &["enter"], "enter", "submit"),
    bind(Action::Quit, &["ctrl+c"], "ctrl+c", "quit"),
];

pub const ERROR_BINDINGS: &[Binding] = &[
    bind(Action::Back, &["esc"], "esc", "dismiss"),
    bind(Action::Quit, &["ctrl+c"], "ctrl+c", "quit"),
];

/// The binding table for a view mode
pub fn bindings(mode: ViewMode) -> &'static [Binding] {
    match mode {
        ViewMode::Table => TABLE_BINDINGS,
        ViewMode::IncidentDetail => DETAIL_BINDINGS,
        ViewMode::TextInput => INPUT_BINDINGS,
        ViewMode::Error => ERROR_BINDINGS,
    }
}

/// Canonical name of a key press ("k", "G", "ctrl+s", "enter", ...)
pub fn key_name(key: &KeyEvent) -> String {
    let base = match key.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pgup".to_string(),
        KeyCode::PageDown => "pgdown".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        _ => return String::new(),
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("ctrl+{}", base)
    } else {
        base
    }
}

/// Resolve a key press to an action in the given mode
pub fn lookup(mode: ViewMode, key: &KeyEvent) -> Option<Action> {
    let name = key_name(key);
    if name.is_empty() {
        return None;
    }
    bindings(mode)
        .iter()
        .find(|binding| binding.keys.contains(&name.as_str()))
        .map(|binding| binding.action)
}

/// How a key name is displayed in help text
pub fn display_key(name: &str) -> &str {
    match name {
        "up" => "↑",
        "down" => "↓",
        other => other,
    }
}

/// One-line help footer for a mode
pub fn help_line(mode: ViewMode) -> String {
    bindings(mode)
        .iter()
        .map(|binding| format!("{} {}", binding.help_key, binding.help))
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_MODES: [ViewMode; 4] = [
        ViewMode::Table,
        ViewMode::IncidentDetail,
        ViewMode::TextInput,
        ViewMode::Error,
    ];

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_help_key_lists_exactly_the_bound_keys() {
        for mode in ALL_MODES {
            for binding in bindings(mode) {
                let expected = binding
                    .keys
                    .iter()
                    .map(|k| display_key(k))
                    .collect::<Vec<_>>()
                    .join("/");
                assert_eq!(
                    binding.help_key, expected,
                    "{:?} {:?} help text is out of sync",
                    mode, binding.action
                );
            }
        }
    }

    #[test]
    fn test_no_key_bound_twice_in_a_mode() {
        for mode in ALL_MODES {
            let mut seen = HashSet::new();
            for binding in bindings(mode) {
                for k in binding.keys {
                    assert!(seen.insert(*k), "{:?}: key {} bound twice", mode, k);
                }
            }
        }
    }

    #[test]
    fn test_every_mode_can_quit() {
        for mode in ALL_MODES {
            assert_eq!(
                lookup(mode, &key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
                Some(Action::Quit)
            );
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(&key(KeyCode::Char('k'), KeyModifiers::NONE)), "k");
        assert_eq!(key_name(&key(KeyCode::Char('G'), KeyModifiers::SHIFT)), "G");
        assert_eq!(
            key_name(&key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            "ctrl+s"
        );
        assert_eq!(key_name(&key(KeyCode::Esc, KeyModifiers::NONE)), "esc");
        assert_eq!(key_name(&key(KeyCode::F(1), KeyModifiers::NONE)), "");
    }

    #[test]
    fn test_lookup_is_mode_specific() {
        let q = key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(lookup(ViewMode::Table, &q), Some(Action::Quit));
        assert_eq!(lookup(ViewMode::TextInput, &q), None);

        let enter = key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(lookup(ViewMode::Table, &enter), Some(Action::View));
        assert_eq!(lookup(ViewMode::TextInput, &enter), Some(Action::Submit));
        assert_eq!(lookup(ViewMode::Error, &enter), None);

        let t = key(KeyCode::Char('T'), KeyModifiers::SHIFT);
        assert_eq!(lookup(ViewMode::Table, &t), Some(Action::ToggleTeam));
    }

    #[test]
    fn test_help_line_mentions_every_binding() {
        let line = help_line(ViewMode::IncidentDetail);
        for binding in DETAIL_BINDINGS {
            assert!(line.contains(binding.help_key));
            assert!(line.contains(binding.help));
        }
    }
}
