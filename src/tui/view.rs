//! Console rendering
//!
//! Draws the state of the console into a frame. Layout from top to bottom:
//! the main area (incident table, detail viewport or error), the status
//! line, and a footer with key help or the input line.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::Theme;
use crate::console::detail::incident_detail_text;
use crate::console::keymap::{self, Action};
use crate::console::{Focus, State, ViewMode};

/// Draw the whole console
pub fn render(frame: &mut Frame, state: &State, theme: &Theme) {
    let [main, status, footer] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    match state.view_mode() {
        ViewMode::Error => render_error(frame, main, state, theme),
        ViewMode::IncidentDetail => render_detail(frame, main, state, theme),
        ViewMode::Table | ViewMode::TextInput => render_table(frame, main, state, theme),
    }
    render_status(frame, status, state, theme);
    render_footer(frame, footer, state, theme);
}

/// Compact age of an incident ("42s", "5m", "3h", "2d")
pub fn age(now: DateTime<Utc>, created: DateTime<Utc>) -> String {
    let secs = (now - created).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}

/// Cut `text` to `width` display columns, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn bordered<'a>(title: String, color: ratatui::style::Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn render_table(frame: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let block = bordered(
        format!(" Incidents: {} ", state.filter.label()),
        if state.focus == Focus::Table {
            theme.border_focused
        } else {
            theme.border
        },
    );

    if state.rows.is_empty() {
        let empty = Paragraph::new("No incidents to show")
            .style(Style::default().fg(theme.text_muted))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["#", "Status", "Urg", "Age", "Service", "Title", "Assigned"]).style(
        Style::default()
            .fg(theme.text_muted)
            .add_modifier(Modifier::BOLD),
    );
    let rows = state.rows.iter().map(|incident| {
        Row::new(vec![
            Cell::from(incident.incident_number.to_string()),
            Cell::from(incident.status.clone()).style(theme.status_style(&incident.status)),
            Cell::from(incident.urgency.clone()).style(theme.urgency_style(&incident.urgency)),
            Cell::from(age(state.now, incident.created_at)),
            Cell::from(incident.service.summary.clone()),
            Cell::from(incident.title.clone()),
            Cell::from(incident.assignee_names()),
        ])
        .style(Style::default().fg(theme.text_primary))
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(16),
        Constraint::Min(20),
        Constraint::Length(18),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut table_state = TableState::default().with_selected(state.cursor);
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_detail(frame: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let scroll = match state.focus {
        Focus::Detail { scroll } => scroll,
        _ => 0,
    };
    let title = match &state.selected {
        Some(incident) => format!(" Incident {} ", incident.id),
        None => " Incident ".to_string(),
    };

    let detail = Paragraph::new(incident_detail_text(state))
        .style(Style::default().fg(theme.text_primary))
        .block(bordered(title, theme.border_focused))
        .scroll((scroll, 0));
    frame.render_widget(detail, area);
}

fn render_error(frame: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let Some(error) = &state.error else {
        return;
    };

    let lines = vec![
        Line::from(Span::styled(
            error.context.clone(),
            Style::default().fg(theme.red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(error.message.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "esc to dismiss",
            Style::default().fg(theme.text_muted),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(bordered(" Error ".to_string(), theme.red));
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let status = Paragraph::new(truncate(&state.status, area.width as usize))
        .style(Style::default().fg(theme.text_secondary));
    frame.render_widget(status, area);
}

/// Help limited to moving between views
fn short_help(mode: ViewMode) -> String {
    keymap::bindings(mode)
        .iter()
        .filter(|binding| {
            matches!(
                binding.action,
                Action::View | Action::Back | Action::Submit | Action::Help | Action::Quit
            )
        })
        .map(|binding| format!("{} {}", binding.help_key, binding.help))
        .collect::<Vec<_>>()
        .join(" • ")
}

fn render_footer(frame: &mut Frame, area: Rect, state: &State, theme: &Theme) {
    let mode = state.view_mode();
    if mode == ViewMode::TextInput {
        let line = Line::from(vec![
            Span::styled(state.input.prompt.clone(), Style::default().fg(theme.blue)),
            Span::styled(
                state.input.value.clone(),
                Style::default().fg(theme.text_primary),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let help = if state.show_help {
        keymap::help_line(mode)
    } else {
        short_help(mode)
    };
    let footer = Paragraph::new(truncate(&help, area.width as usize))
        .style(Style::default().fg(theme.text_muted));
    frame.render_widget(footer, area);
}
