//! Files: one directory listing with a selectable row

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::browser::FileEntry;
use crate::controller::Controller;
use crate::sources::HostSources;
use crate::tui::theme::Theme;
use crate::utils::{display_path, format_bytes, truncate_to_width};

const NAME_WIDTH: u16 = 40;

pub fn render<S: HostSources>(f: &mut Frame, area: Rect, controller: &Controller<S>, theme: &Theme) {
    let title_text = truncate_to_width(
        &display_path(controller.current_dir()),
        usize::from(area.width.saturating_sub(4)),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border())
        .title(Span::styled(title_text, theme.header()));

    let entries = match controller.files() {
        Some(stamped) if !stamped.value().is_empty() => stamped.value(),
        Some(_) => {
            let empty = Paragraph::new(Line::from(Span::styled(
                "(empty directory)",
                theme.secondary(),
            )))
            .block(block);
            f.render_widget(empty, area);
            return;
        }
        None => {
            let loading =
                Paragraph::new(Line::from(Span::styled("Listing…", theme.secondary()))).block(block);
            f.render_widget(loading, area);
            return;
        }
    };

    let header = Row::new(vec!["NAME", "SIZE", "MODIFIED", "MODE"])
        .style(theme.header())
        .bottom_margin(1);

    let rows: Vec<Row> = entries.iter().map(|entry| entry_row(entry, theme)).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(NAME_WIDTH),
            Constraint::Length(11),
            Constraint::Length(16),
            Constraint::Min(4),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(theme.selected())
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(controller.selected_file()));
    f.render_stateful_widget(table, area, &mut state);
}

fn entry_row<'a>(entry: &FileEntry, theme: &Theme) -> Row<'a> {
    let (name, style, size) = if entry.is_directory {
        (
            format!("{}/", entry.name),
            theme.directory(),
            "-".to_string(),
        )
    } else {
        (entry.name.clone(), theme.primary(), format_bytes(entry.size))
    };
    let modified = entry
        .modified
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string());

    Row::new(vec![
        Cell::from(Span::styled(
            truncate_to_width(&name, usize::from(NAME_WIDTH)),
            style,
        )),
        Cell::from(size),
        Cell::from(modified),
        Cell::from(entry.permissions.clone()),
    ])
}
