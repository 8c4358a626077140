//! crossterm events to controller inputs

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::controller::{EventSource, Input};

/// Reads the real terminal.
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                return Ok(None);
            }
            if let Some(input) = translate(event::read()?) {
                return Ok(Some(input));
            }
        }
    }
}

/// Key presses and resizes; releases, repeats of modifiers, mouse and focus
/// events are ignored.
pub fn translate(event: Event) -> Option<Input> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => translate_key(key),
        Event::Resize(..) => Some(Input::Resize),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Input::Interrupt),
            _ => None,
        };
    }
    let input = match key.code {
        KeyCode::Char(c) => Input::Char(c),
        KeyCode::Enter => Input::Enter,
        KeyCode::Backspace => Input::Backspace,
        KeyCode::Esc => Input::Escape,
        KeyCode::Up => Input::Up,
        KeyCode::Down => Input::Down,
        KeyCode::PageUp => Input::PageUp,
        KeyCode::PageDown => Input::PageDown,
        KeyCode::Home => Input::Home,
        KeyCode::End => Input::End,
        _ => return None,
    };
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn press(code: KeyCode) -> Event {
        key(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn test_translate_keys() {
        assert_eq!(translate(press(KeyCode::Char('p'))), Some(Input::Char('p')));
        assert_eq!(translate(press(KeyCode::Enter)), Some(Input::Enter));
        assert_eq!(translate(press(KeyCode::Esc)), Some(Input::Escape));
        assert_eq!(translate(press(KeyCode::PageDown)), Some(Input::PageDown));
        assert_eq!(translate(press(KeyCode::F(5))), None);
    }

    #[test]
    fn test_ctrl_c_interrupts() {
        let event = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(translate(event), Some(Input::Interrupt));
        let event = key(KeyCode::Char('x'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(translate(event), None);
    }

    #[test]
    fn test_shifted_letters_pass_through() {
        let event = key(KeyCode::Char('Q'), KeyModifiers::SHIFT, KeyEventKind::Press);
        assert_eq!(translate(event), Some(Input::Char('Q')));
    }

    #[test]
    fn test_releases_and_resizes() {
        let release = key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(translate(release), None);
        assert_eq!(translate(Event::Resize(80, 24)), Some(Input::Resize));
        assert_eq!(translate(Event::FocusGained), None);
    }
}
