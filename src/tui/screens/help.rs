//! Help: the key map

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::controller::Controller;
use crate::sources::HostSources;
use crate::tui::theme::Theme;

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("d / p / f / t", "Dashboard / Processes / Files / Terminal"),
    ("r", "Refresh the current view"),
    ("c", "Clear and redraw the screen"),
    ("h", "This help"),
    ("q, Esc, Ctrl-C", "Quit"),
];

const VIEW_KEYS: &[(&str, &str)] = &[
    ("↑ ↓ PgUp PgDn Home End", "Move the selection or scroll output"),
    ("k, then y", "Terminate the selected process (SIGTERM)"),
    ("Enter", "Open the selected directory"),
    ("Backspace", "Go to the parent directory"),
    ("~", "Go to the home directory"),
];

const TERMINAL_KEYS: &[(&str, &str)] = &[
    ("Enter", "Run the command line"),
    ("↑ ↓", "Command history"),
    ("Esc", "Back to the Dashboard"),
    ("clear", "Clear the output pane"),
];

pub fn render<S: HostSources>(f: &mut Frame, area: Rect, _controller: &Controller<S>, theme: &Theme) {
    let mut lines = Vec::new();
    for (heading, keys) in [
        ("Anywhere", GLOBAL_KEYS),
        ("Processes and Files", VIEW_KEYS),
        ("Terminal", TERMINAL_KEYS),
    ] {
        lines.push(Line::from(Span::styled(heading, theme.title())));
        for (key, description) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<24}", key), theme.emphasis()),
                Span::styled(*description, theme.primary()),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Press any other key to return to the Dashboard.",
        theme.secondary(),
    )));

    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border())
                .title(Span::styled("Help", theme.header())),
        );
    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{controller, draw, press};

    #[test]
    fn test_help_lists_key_map() {
        let mut controller = controller();
        press(&mut controller, "h");
        let frame = draw(&controller, 100, 40);
        assert!(frame.contains("Terminate the selected process"));
        assert!(frame.contains("Quit"));
    }
}
