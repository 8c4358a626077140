//! View states and the input vocabulary shared by every front end

use super::refresh::Source;

/// The active view. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Dashboard,
    Processes,
    Files,
    Terminal,
    Help,
}

impl ViewState {
    /// Views reachable from the tab bar, in order
    pub const TABS: [ViewState; 4] = [
        ViewState::Dashboard,
        ViewState::Processes,
        ViewState::Files,
        ViewState::Terminal,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewState::Dashboard => "Dashboard",
            ViewState::Processes => "Processes",
            ViewState::Files => "Files",
            ViewState::Terminal => "Terminal",
            ViewState::Help => "Help",
        }
    }

    /// Key that switches to this view
    pub fn hotkey(self) -> char {
        match self {
            ViewState::Dashboard => 'd',
            ViewState::Processes => 'p',
            ViewState::Files => 'f',
            ViewState::Terminal => 't',
            ViewState::Help => 'h',
        }
    }

    pub fn from_hotkey(key: char) -> Option<ViewState> {
        [
            ViewState::Dashboard,
            ViewState::Processes,
            ViewState::Files,
            ViewState::Terminal,
            ViewState::Help,
        ]
        .into_iter()
        .find(|view| view.hotkey() == key)
    }

    /// Sources a manual refresh fetches in this view.
    pub fn sources(self) -> &'static [Source] {
        match self {
            ViewState::Dashboard => &[Source::System],
            ViewState::Processes => &[Source::Processes],
            ViewState::Files => &[Source::Files],
            ViewState::Terminal | ViewState::Help => &[],
        }
    }

    /// Sources kept fresh on the cadence while this view is active.
    ///
    /// Directory listings are never refreshed on a timer.
    pub fn timed_sources(self) -> &'static [Source] {
        match self {
            ViewState::Dashboard => &[Source::System],
            ViewState::Processes => &[Source::Processes],
            _ => &[],
        }
    }

    /// In text-entry views printable keys are typed, not interpreted.
    pub fn captures_text(self) -> bool {
        self == ViewState::Terminal
    }
}

/// Front-end independent input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Enter,
    Backspace,
    Escape,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    /// Ctrl-C
    Interrupt,
    Resize,
}

/// What the loop should do after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkeys_round_trip() {
        for view in ViewState::TABS {
            assert_eq!(ViewState::from_hotkey(view.hotkey()), Some(view));
        }
        assert_eq!(ViewState::from_hotkey('h'), Some(ViewState::Help));
        assert_eq!(ViewState::from_hotkey('x'), None);
    }

    #[test]
    fn test_files_never_on_timer() {
        for view in ViewState::TABS {
            assert!(!view.timed_sources().contains(&Source::Files));
        }
    }
}
