//! Terminal: one-shot command entry and its captured output

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::controller::Controller;
use crate::runner::{CommandResult, CommandStatus};
use crate::sources::HostSources;
use crate::tui::theme::Theme;
use crate::utils::format_elapsed;

pub fn render<S: HostSources>(f: &mut Frame, area: Rect, controller: &Controller<S>, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Output
            Constraint::Length(3), // Command line
        ])
        .split(area);

    let terminal = controller.terminal();

    let (title, body) = match (terminal.queued(), terminal.last_result()) {
        (Some(command), _) => (
            Line::from(Span::styled(format!("Running: {}", command), theme.warning())),
            Paragraph::new(Line::from(Span::styled(
                "Waiting for the command to finish…",
                theme.secondary(),
            ))),
        ),
        (None, Some(result)) => (
            result_title(result, theme),
            Paragraph::new(result.output.as_str()).scroll((terminal.scroll(), 0)),
        ),
        (None, None) => (
            Line::from(Span::styled("Output", theme.header())),
            Paragraph::new(Line::from(Span::styled(
                "Type a command and press Enter. It runs once through the shell; `clear` clears this pane.",
                theme.secondary(),
            ))),
        ),
    };

    let output = body.block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(title),
    );
    f.render_widget(output, chunks[0]);

    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("$ ", theme.emphasis()),
        Span::raw(terminal.line()),
        Span::styled("█", theme.secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(Span::styled("Command", theme.header())),
    );
    f.render_widget(prompt, chunks[1]);
}

fn result_title<'a>(result: &CommandResult, theme: &Theme) -> Line<'a> {
    let (outcome, style) = match &result.status {
        CommandStatus::Exited(0) => ("exit 0".to_string(), theme.success()),
        CommandStatus::Exited(code) => (format!("exit {}", code), theme.warning()),
        CommandStatus::Signaled(signal) => (format!("signal {}", signal), theme.warning()),
        CommandStatus::TimedOut => ("timed out".to_string(), theme.error()),
        CommandStatus::FailedToStart(_) => ("failed to start".to_string(), theme.error()),
    };

    let mut spans = vec![
        Span::styled(format!("$ {} ", result.command), theme.header()),
        Span::styled(outcome, style),
        Span::styled(format!(" · {}", format_elapsed(result.duration)), theme.secondary()),
    ];
    if result.truncated {
        spans.push(Span::styled(" · truncated", theme.warning()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{controller, draw, press};
    use crate::controller::Input;

    #[test]
    fn test_terminal_shows_running_then_output() {
        let mut controller = controller();
        press(&mut controller, "tuptime");
        assert!(draw(&controller, 100, 30).contains("$ uptime█"));

        controller.handle_input(Input::Enter);
        assert!(draw(&controller, 100, 30).contains("Running: uptime"));

        controller.run_queued_command();
        let frame = draw(&controller, 100, 30);
        assert!(frame.contains("$ uptime exit 0"));
        assert!(frame.contains("ran uptime"));
    }
}
