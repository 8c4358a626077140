//! Command line editing, history and output scrolling for the Terminal view

use std::sync::Arc;

use crate::runner::CommandResult;

const HISTORY_LIMIT: usize = 100;
const PAGE: u16 = 10;

#[derive(Debug, Default)]
pub struct TerminalState {
    line: String,
    history: Vec<String>,
    /// Index into `history` while recalling; `None` when editing a fresh line
    recall: Option<usize>,
    queued: Option<String>,
    last_result: Option<Arc<CommandResult>>,
    scroll: u16,
}

impl TerminalState {
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The command waiting to run, shown as "running" until it finishes.
    pub fn queued(&self) -> Option<&str> {
        self.queued.as_deref()
    }

    pub fn last_result(&self) -> Option<&CommandResult> {
        self.last_result.as_deref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub(crate) fn type_char(&mut self, c: char) {
        self.line.push(c);
        self.recall = None;
    }

    pub(crate) fn backspace(&mut self) {
        self.line.pop();
        self.recall = None;
    }

    /// Consume the edited line. Returns the trimmed command, if any.
    pub(crate) fn submit(&mut self) -> Option<String> {
        let command = self.line.trim().to_string();
        self.line.clear();
        self.recall = None;
        if command.is_empty() {
            return None;
        }
        if self.history.last() != Some(&command) {
            self.history.push(command.clone());
            if self.history.len() > HISTORY_LIMIT {
                self.history.remove(0);
            }
        }
        Some(command)
    }

    pub(crate) fn recall_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.recall {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.recall = Some(index);
        self.line = self.history[index].clone();
    }

    pub(crate) fn recall_next(&mut self) {
        match self.recall {
            None => {}
            Some(i) if i + 1 < self.history.len() => {
                self.recall = Some(i + 1);
                self.line = self.history[i + 1].clone();
            }
            Some(_) => {
                self.recall = None;
                self.line.clear();
            }
        }
    }

    pub(crate) fn queue(&mut self, command: String) {
        self.queued = Some(command);
    }

    pub(crate) fn take_queued(&mut self) -> Option<String> {
        self.queued.take()
    }

    pub(crate) fn show(&mut self, result: CommandResult) {
        self.last_result = Some(Arc::new(result));
        self.scroll = 0;
    }

    pub(crate) fn clear_output(&mut self) {
        self.last_result = None;
        self.scroll = 0;
    }

    fn max_scroll(&self) -> u16 {
        let lines = self
            .last_result
            .as_ref()
            .map(|result| result.output.lines().count())
            .unwrap_or(0);
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    pub(crate) fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub(crate) fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub(crate) fn page_up(&mut self) {
        self.scroll_up(PAGE);
    }

    pub(crate) fn page_down(&mut self) {
        self.scroll_down(PAGE);
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }
}
