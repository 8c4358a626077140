//! Terminal front end: raw mode, alternate screen and the render loop

pub mod events;
pub mod screens;
pub mod theme;
pub mod widgets;

use std::io::{self, Stdout};

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::controller::{run_loop, Controller};
use crate::error::StartupError;
use crate::sources::HostSources;

use events::CrosstermEvents;
use theme::Theme;

/// Take over the terminal and run until the user quits.
///
/// The terminal is restored on every exit path, including errors.
pub fn run<S: HostSources>(controller: &mut Controller<S>, theme: Theme) -> anyhow::Result<()> {
    let mut stdout = io::stdout();

    terminal::enable_raw_mode().map_err(StartupError::Terminal)?;
    if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
        let _ = terminal::disable_raw_mode();
        return Err(StartupError::Terminal(err).into());
    }

    let result = run_inner(stdout, controller, theme);

    let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    debug!("terminal restored");

    result
}

fn run_inner<S: HostSources>(
    stdout: Stdout,
    controller: &mut Controller<S>,
    theme: Theme,
) -> anyhow::Result<()> {
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout)).map_err(StartupError::Terminal)?;
    terminal.clear()?;

    run_loop(controller, &mut CrosstermEvents, |controller| {
        if controller.take_redraw() {
            terminal.clear()?;
        }
        terminal.draw(|f| screens::render(f, controller, &theme))?;
        Ok(())
    })?;
    Ok(())
}
