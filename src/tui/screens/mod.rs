//! Screen rendering modules

pub mod dashboard;
pub mod files;
pub mod help;
pub mod processes;
pub mod terminal;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::controller::{Controller, ViewState};
use crate::sources::HostSources;
use crate::tui::theme::Theme;
use crate::tui::widgets::{get_shortcuts, render_header, render_shortcuts, render_status, HEADER_HEIGHT};

type Renderer<S> = fn(&mut Frame, Rect, &Controller<S>, &Theme);

/// The per-view render dispatch table.
fn renderer<S: HostSources>(view: ViewState) -> Renderer<S> {
    match view {
        ViewState::Dashboard => dashboard::render::<S>,
        ViewState::Processes => processes::render::<S>,
        ViewState::Files => files::render::<S>,
        ViewState::Terminal => terminal::render::<S>,
        ViewState::Help => help::render::<S>,
    }
}

/// Draw one frame from controller state.
pub fn render<S: HostSources>(f: &mut Frame, controller: &Controller<S>, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // Tabs
            Constraint::Min(3),                // Active view
            Constraint::Length(1),             // Status line
            Constraint::Length(1),             // Shortcuts
        ])
        .split(f.area());

    render_header(f, chunks[0], controller, theme);
    renderer::<S>(controller.view())(f, chunks[1], controller, theme);
    render_status(
        f,
        chunks[2],
        controller.status(),
        controller.is_refreshing(),
        theme,
    );
    let shortcuts = get_shortcuts(controller.view(), controller.pending_kill().is_some());
    render_shortcuts(f, chunks[3], &shortcuts, theme);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::browser::BrowserState;
    use crate::controller::testing::FakeHost;
    use crate::controller::{Controller, ControllerOptions, Input};
    use crate::tui::theme::Theme;

    pub fn controller() -> Controller<FakeHost> {
        let mut controller = Controller::new(
            FakeHost::default(),
            BrowserState::for_tests(PathBuf::from("/")),
            ControllerOptions::default(),
        );
        controller.run_pending();
        controller
    }

    pub fn press(controller: &mut Controller<FakeHost>, keys: &str) {
        for c in keys.chars() {
            controller.handle_input(Input::Char(c));
        }
        controller.run_pending();
    }

    /// Render a full frame and return it as text, one line per row.
    pub fn draw(controller: &Controller<FakeHost>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| super::render(f, controller, &Theme::monochrome()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }
}
