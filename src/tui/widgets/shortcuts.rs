//! Status line and keyboard shortcut bar

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::controller::{StatusMessage, ViewState};
use crate::tui::theme::Theme;

/// Key hints for a view, as (key, description) pairs
pub fn get_shortcuts(view: ViewState, confirming_kill: bool) -> Vec<(&'static str, &'static str)> {
    if confirming_kill {
        return vec![("y", "Confirm"), ("any", "Cancel")];
    }
    match view {
        ViewState::Dashboard => vec![
            ("p", "Processes"),
            ("f", "Files"),
            ("t", "Terminal"),
            ("r", "Refresh"),
            ("h", "Help"),
            ("q", "Quit"),
        ],
        ViewState::Processes => vec![
            ("↑↓", "Select"),
            ("k", "Kill"),
            ("r", "Refresh"),
            ("d", "Dashboard"),
            ("h", "Help"),
            ("q", "Quit"),
        ],
        ViewState::Files => vec![
            ("↑↓", "Select"),
            ("Enter", "Open"),
            ("Bksp", "Up"),
            ("~", "Home"),
            ("r", "Reload"),
            ("q", "Quit"),
        ],
        ViewState::Terminal => vec![
            ("Enter", "Run"),
            ("↑↓", "History"),
            ("PgUp/PgDn", "Scroll"),
            ("Esc", "Dashboard"),
            ("Ctrl-C", "Quit"),
        ],
        ViewState::Help => vec![("any key", "Back"), ("q", "Quit")],
    }
}

pub fn render_shortcuts(
    f: &mut Frame,
    area: Rect,
    shortcuts: &[(&str, &str)],
    theme: &Theme,
) {
    let mut spans = Vec::with_capacity(shortcuts.len() * 3);
    for (i, (key, description)) in shortcuts.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme.secondary()));
        }
        spans.push(Span::styled(*key, theme.emphasis()));
        spans.push(Span::styled(format!(" {}", description), theme.secondary()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// The transient status line; blank when there is nothing to say.
pub fn render_status(
    f: &mut Frame,
    area: Rect,
    status: Option<&StatusMessage>,
    refreshing: bool,
    theme: &Theme,
) {
    let line = match status {
        Some(message) => Line::from(Span::styled(
            message.text.clone(),
            theme.status(message.level),
        )),
        None if refreshing => Line::from(Span::styled("Refreshing…", theme.secondary())),
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(line), area);
}
