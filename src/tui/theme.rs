//! Theme and styling for the TUI
//!
//! With color the usual traffic-light palette is used for gauges and status
//! lines. Without it everything falls back to typography (bold, dim,
//! underline, reverse), which reads fine on any terminal.

use ratatui::style::{Color, Modifier, Style};

use crate::config::ColorChoice;
use crate::controller::StatusLevel;

/// Percentages at or above these are shown as warning / critical
const WARN_PERCENT: f64 = 60.0;
const CRITICAL_PERCENT: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    color: bool,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn monochrome() -> Self {
        Self::new(false)
    }

    /// Resolve `--color` against the environment and the terminal.
    pub fn detect(choice: ColorChoice) -> Self {
        let color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => supports_color(
                std::env::var_os("NO_COLOR").is_some(),
                std::env::var("TERM").ok().as_deref(),
                crossterm::style::available_color_count(),
            ),
        };
        Self::new(color)
    }

    pub fn uses_color(&self) -> bool {
        self.color
    }

    fn tint(&self, style: Style, color: Color) -> Style {
        if self.color {
            style.fg(color)
        } else {
            style
        }
    }

    pub fn title(&self) -> Style {
        self.tint(Style::default().add_modifier(Modifier::BOLD), Color::Cyan)
    }

    pub fn header(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn primary(&self) -> Style {
        Style::default()
    }

    pub fn secondary(&self) -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    pub fn emphasis(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    /// Selected row: reverse video reads the same in color and mono
    pub fn selected(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    }

    pub fn active_tab(&self) -> Style {
        self.tint(
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            Color::Cyan,
        )
    }

    pub fn border(&self) -> Style {
        self.tint(Style::default(), Color::DarkGray)
    }

    pub fn directory(&self) -> Style {
        self.tint(Style::default().add_modifier(Modifier::BOLD), Color::Blue)
    }

    pub fn success(&self) -> Style {
        self.tint(Style::default().add_modifier(Modifier::BOLD), Color::Green)
    }

    pub fn warning(&self) -> Style {
        self.tint(Style::default().add_modifier(Modifier::BOLD), Color::Yellow)
    }

    pub fn error(&self) -> Style {
        self.tint(
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            Color::Red,
        )
    }

    pub fn status(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => self.emphasis(),
            StatusLevel::Warning => self.warning(),
            StatusLevel::Error => self.error(),
        }
    }

    /// Gauge fill for a usage percentage
    pub fn gauge(&self, percent: f64) -> Style {
        if !self.color {
            return if percent >= CRITICAL_PERCENT {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
        }
        let color = if percent >= CRITICAL_PERCENT {
            Color::Red
        } else if percent >= WARN_PERCENT {
            Color::Yellow
        } else {
            Color::Green
        };
        Style::default().fg(color)
    }
}

/// Whether a terminal should get color.
///
/// `NO_COLOR` (any value) and `TERM=dumb` turn it off; otherwise at least 8
/// colors are required.
pub fn supports_color(no_color: bool, term: Option<&str>, colors: u16) -> bool {
    if no_color {
        return false;
    }
    if matches!(term, Some("dumb")) {
        return false;
    }
    colors >= 8
}
