//! Tab bar with a one-line host summary

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Tabs},
    Frame,
};

use crate::controller::{Controller, ViewState};
use crate::sources::HostSources;
use crate::tui::theme::Theme;

pub const HEADER_HEIGHT: u16 = 3;

pub fn render_header<S: HostSources>(
    f: &mut Frame,
    area: Rect,
    controller: &Controller<S>,
    theme: &Theme,
) {
    let titles: Vec<Line> = ViewState::TABS
        .iter()
        .map(|view| {
            Line::from(vec![
                Span::styled(format!("[{}]", view.hotkey()), theme.secondary()),
                Span::raw(" "),
                Span::raw(view.title()),
            ])
        })
        .collect();
    let selected = ViewState::TABS
        .iter()
        .position(|view| *view == controller.view());

    let host = match controller.system() {
        Some(stamped) => {
            let snapshot = stamped.value();
            format!(" {} · {} ", snapshot.hostname, snapshot.kernel_version)
        }
        None => " hostwatch ".to_string(),
    };

    // Help is not a tab; nothing is highlighted while it is open
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border())
                .title(Span::styled(host, theme.title())),
        )
        .style(theme.primary())
        .highlight_style(theme.active_tab())
        .divider(Span::styled("|", theme.secondary()))
        .select(selected);
    f.render_widget(tabs, area);
}
