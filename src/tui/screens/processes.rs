//! Processes: the busiest processes with a selectable row

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::controller::Controller;
use crate::sources::HostSources;
use crate::tui::theme::Theme;
use crate::utils::truncate_to_width;

const NAME_WIDTH: u16 = 28;

pub fn render<S: HostSources>(f: &mut Frame, area: Rect, controller: &Controller<S>, theme: &Theme) {
    let top_n = controller.options().top_n;
    let Some(stamped) = controller.processes() else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Reading process table…",
            theme.secondary(),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border())
                .title(Span::styled("Processes", theme.header())),
        );
        f.render_widget(waiting, area);
        return;
    };
    let records = stamped.value();

    let header = Row::new(vec!["PID", "NAME", "CPU%", "MEM%", "STATUS"])
        .style(theme.header())
        .bottom_margin(1);

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let marker = if controller.pending_kill() == Some(record.pid) {
                theme.warning()
            } else {
                theme.primary()
            };
            Row::new(vec![
                Cell::from(record.pid.to_string()),
                Cell::from(truncate_to_width(&record.name, usize::from(NAME_WIDTH))),
                Cell::from(format!("{:>5.1}", record.cpu_percent)),
                Cell::from(format!("{:>5.1}", record.memory_percent)),
                Cell::from(record.status.clone()),
            ])
            .style(marker)
        })
        .collect();

    let title = format!("Processes · top {} by CPU", top_n);

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(NAME_WIDTH),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(Span::styled(title, theme.header())),
    )
    .row_highlight_style(theme.selected())
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(controller.selected_process()));
    f.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{controller, draw, press};

    #[test]
    fn test_processes_table_lists_records() {
        let mut controller = controller();
        press(&mut controller, "p");
        let frame = draw(&controller, 100, 30);
        assert!(frame.contains("PID"));
        assert!(frame.contains("busy"));
        assert!(frame.contains("idle"));
        assert!(frame.contains("50.0"));
        assert!(frame.contains("> 42"));
    }
}
