//! The view controller: one owner for view state, snapshots and refresh
//!
//! Front ends feed [`Input`]s in and render from the read-only accessors.
//! Every OS request goes through the [`HostSources`] the controller owns, and
//! every per-operation error comes back out as a transient status message.

mod event_loop;
mod refresh;
mod terminal;
mod view;

pub use event_loop::{run_loop, EventSource};
pub use refresh::{RefreshGuard, Refreshed, Source, Stamped};
pub use terminal::TerminalState;
pub use view::{Flow, Input, ViewState};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::browser::{BrowserState, FileEntry};
use crate::error::{BrowseError, NavigationBlock, ProcessError};
use crate::metrics::SystemSnapshot;
use crate::processes::{ProcessRecord, DEFAULT_TOP};
use crate::runner::CommandStatus;
use crate::sources::HostSources;

/// Rows moved by PgUp/PgDn in tables
const TABLE_PAGE: usize = 10;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub cadence: Duration,
    pub top_n: usize,
    pub command_timeout: Duration,
    pub refresh_budget: Duration,
    pub status_ttl: Duration,
    pub home: Option<PathBuf>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(2),
            top_n: DEFAULT_TOP,
            command_timeout: Duration::from_secs(10),
            refresh_budget: Duration::from_secs(1),
            status_ttl: Duration::from_secs(5),
            home: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// A transient, view-local message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    pub at: Instant,
}

type InputHandler<S> = fn(&mut Controller<S>, Input) -> Flow;

pub struct Controller<S: HostSources> {
    sources: S,
    options: ControllerOptions,
    view: ViewState,
    system: Option<Stamped<SystemSnapshot>>,
    processes: Option<Stamped<Vec<ProcessRecord>>>,
    files: Option<Stamped<Vec<FileEntry>>>,
    browser: BrowserState,
    process_selected: usize,
    file_selected: usize,
    /// Pid awaiting a 'y' before SIGTERM is sent
    pending_kill: Option<u32>,
    terminal: TerminalState,
    guard: RefreshGuard,
    status: Option<StatusMessage>,
    redraw: bool,
}

impl<S: HostSources> Controller<S> {
    /// Starts on the Dashboard with its data requested.
    pub fn new(sources: S, browser: BrowserState, options: ControllerOptions) -> Self {
        let mut controller = Self {
            sources,
            options,
            view: ViewState::Dashboard,
            system: None,
            processes: None,
            files: None,
            browser,
            process_selected: 0,
            file_selected: 0,
            pending_kill: None,
            terminal: TerminalState::default(),
            guard: RefreshGuard::default(),
            status: None,
            redraw: false,
        };
        controller.enter(ViewState::Dashboard, Instant::now());
        controller
    }

    // Read-only state for renderers

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn system(&self) -> Option<&Stamped<SystemSnapshot>> {
        self.system.as_ref()
    }

    pub fn processes(&self) -> Option<&Stamped<Vec<ProcessRecord>>> {
        self.processes.as_ref()
    }

    pub fn files(&self) -> Option<&Stamped<Vec<FileEntry>>> {
        self.files.as_ref()
    }

    pub fn current_dir(&self) -> &Path {
        self.browser.current_path()
    }

    pub fn selected_process(&self) -> usize {
        self.process_selected
    }

    pub fn selected_file(&self) -> usize {
        self.file_selected
    }

    pub fn pending_kill(&self) -> Option<u32> {
        self.pending_kill
    }

    pub fn terminal(&self) -> &TerminalState {
        &self.terminal
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.guard.any_pending()
    }

    /// Refresh requests dropped because the same source was already pending.
    pub fn dropped_refreshes(&self) -> u64 {
        self.guard.dropped()
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    /// Whether the front end was asked to clear and redraw; resets the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // Input

    pub fn handle_input(&mut self, input: Input) -> Flow {
        match input {
            Input::Interrupt => return Flow::Exit,
            Input::Resize => {
                self.redraw = true;
                return Flow::Continue;
            }
            _ => {}
        }

        if self.view.captures_text() {
            return Self::input_handler(self.view)(self, input);
        }

        if self.pending_kill.is_some() {
            self.confirm_kill(input);
            return Flow::Continue;
        }

        if let Some(flow) = self.global_command(input) {
            return flow;
        }

        Self::input_handler(self.view)(self, input)
    }

    /// The per-view input dispatch table.
    fn input_handler(view: ViewState) -> InputHandler<S> {
        match view {
            ViewState::Dashboard => Self::dashboard_input,
            ViewState::Processes => Self::processes_input,
            ViewState::Files => Self::files_input,
            ViewState::Terminal => Self::terminal_input,
            ViewState::Help => Self::help_input,
        }
    }

    fn global_command(&mut self, input: Input) -> Option<Flow> {
        let key = match input {
            Input::Escape => return Some(Flow::Exit),
            Input::Char(c) => c.to_ascii_lowercase(),
            _ => return None,
        };

        match key {
            'q' => Some(Flow::Exit),
            'r' => {
                self.refresh_active();
                Some(Flow::Continue)
            }
            'c' => {
                self.redraw = true;
                Some(Flow::Continue)
            }
            other => ViewState::from_hotkey(other).map(|view| {
                self.switch_to(view);
                Flow::Continue
            }),
        }
    }

    fn dashboard_input(&mut self, _input: Input) -> Flow {
        Flow::Continue
    }

    fn help_input(&mut self, _input: Input) -> Flow {
        self.switch_to(ViewState::Dashboard);
        Flow::Continue
    }

    fn processes_input(&mut self, input: Input) -> Flow {
        let len = self
            .processes
            .as_ref()
            .map(|stamped| stamped.value().len())
            .unwrap_or(0);

        match input {
            Input::Char(c) if c.eq_ignore_ascii_case(&'k') => self.arm_kill(),
            other => {
                if let Some(index) = moved(self.process_selected, len, other) {
                    self.process_selected = index;
                }
            }
        }
        Flow::Continue
    }

    fn files_input(&mut self, input: Input) -> Flow {
        let len = self
            .files
            .as_ref()
            .map(|stamped| stamped.value().len())
            .unwrap_or(0);

        match input {
            Input::Enter => self.descend(),
            Input::Backspace => self.ascend(),
            Input::Char('~') => self.go_home(),
            other => {
                if let Some(index) = moved(self.file_selected, len, other) {
                    self.file_selected = index;
                }
            }
        }
        Flow::Continue
    }

    fn terminal_input(&mut self, input: Input) -> Flow {
        match input {
            Input::Escape => self.switch_to(ViewState::Dashboard),
            Input::Char(c) => self.terminal.type_char(c),
            Input::Backspace => self.terminal.backspace(),
            Input::Enter => self.submit_command(),
            Input::Up => self.terminal.recall_previous(),
            Input::Down => self.terminal.recall_next(),
            Input::PageUp => self.terminal.page_up(),
            Input::PageDown => self.terminal.page_down(),
            Input::Home => self.terminal.scroll_to_top(),
            Input::End => self.terminal.scroll_to_bottom(),
            Input::Interrupt | Input::Resize => {}
        }
        Flow::Continue
    }

    // View transitions

    pub fn switch_to(&mut self, view: ViewState) {
        if view == self.view {
            return;
        }
        debug!(from = ?self.view, to = ?view, "switching view");
        self.view = view;
        self.status = None;
        self.pending_kill = None;
        self.enter(view, Instant::now());
    }

    fn enter(&mut self, view: ViewState, now: Instant) {
        match view {
            ViewState::Dashboard | ViewState::Processes => {
                for source in view.timed_sources() {
                    if self.is_stale(*source, now) {
                        self.request(*source);
                    }
                }
            }
            ViewState::Files => {
                self.request(Source::Files);
            }
            ViewState::Terminal | ViewState::Help => {}
        }
    }

    // Refresh

    /// Ask for a source to be fetched on the next `run_pending`.
    pub fn request(&mut self, source: Source) -> bool {
        let accepted = self.guard.request(source);
        if !accepted {
            debug!(source = source.label(), "refresh already pending, dropped");
        }
        accepted
    }

    /// The 'r' key. Repeated presses within one cadence refresh once.
    pub fn refresh_active(&mut self) {
        let now = Instant::now();
        for source in self.view.sources() {
            if !self
                .guard
                .request_manual(*source, now, self.options.cadence)
            {
                debug!(source = source.label(), "manual refresh within cadence, dropped");
            }
        }
    }

    fn is_stale(&self, source: Source, now: Instant) -> bool {
        let at = match source {
            Source::System => self.system.as_ref().map(Stamped::at),
            Source::Processes => self.processes.as_ref().map(Stamped::at),
            Source::Files => self.files.as_ref().map(Stamped::at),
        };
        match at {
            Some(at) => now.saturating_duration_since(at) >= self.options.cadence,
            None => true,
        }
    }

    /// A timeout with no input: expire the status line and request stale data.
    pub fn tick(&mut self, now: Instant) {
        if let Some(status) = &self.status {
            if now.saturating_duration_since(status.at) >= self.options.status_ttl {
                self.status = None;
            }
        }
        for source in self.view.timed_sources() {
            if self.is_stale(*source, now) {
                self.request(*source);
            }
        }
    }

    /// How long the loop may wait for input before something is due.
    pub fn next_refresh_in(&self, now: Instant) -> Duration {
        let mut wait = self.options.cadence;
        for source in self.view.timed_sources() {
            let at = match source {
                Source::System => self.system.as_ref().map(Stamped::at),
                Source::Processes => self.processes.as_ref().map(Stamped::at),
                Source::Files => None,
            };
            let due = match at {
                Some(at) => (at + self.options.cadence).saturating_duration_since(now),
                None => Duration::ZERO,
            };
            wait = wait.min(due);
        }
        if let Some(status) = &self.status {
            wait = wait.min((status.at + self.options.status_ttl).saturating_duration_since(now));
        }
        wait
    }

    /// Fetch every pending source, timing each call against the budget.
    pub fn run_pending(&mut self) {
        for source in self.guard.take() {
            let started = Instant::now();
            let refreshed = self.fetch(source);
            let elapsed = started.elapsed();
            debug!(source = source.label(), ?elapsed, "refreshed");

            self.apply(refreshed);

            if elapsed > self.options.refresh_budget {
                warn!(
                    source = source.label(),
                    ?elapsed,
                    budget = ?self.options.refresh_budget,
                    "refresh over budget"
                );
                self.set_status(
                    StatusLevel::Warning,
                    format!(
                        "Refreshing {} took {}",
                        source.label(),
                        crate::utils::format_elapsed(elapsed)
                    ),
                );
            }
        }
    }

    fn fetch(&mut self, source: Source) -> Refreshed {
        match source {
            Source::System => Refreshed::System(self.sources.sample()),
            Source::Processes => Refreshed::Processes(self.sources.list_top(self.options.top_n)),
            Source::Files => {
                let path = self.browser.current_path().to_path_buf();
                let result = self.sources.list(&path);
                Refreshed::Files { path, result }
            }
        }
    }

    /// Install a fetched result. Failures keep the previous snapshot.
    pub fn apply(&mut self, refreshed: Refreshed) {
        let now = Instant::now();
        match refreshed {
            Refreshed::System(Ok(snapshot)) => {
                self.system = Some(Stamped::new(snapshot, now));
            }
            Refreshed::System(Err(err)) => {
                warn!(%err, "sampling metrics failed");
                self.set_status(StatusLevel::Error, format!("Metrics unavailable: {}", err));
            }
            Refreshed::Processes(records) => {
                self.process_selected = clamp_index(self.process_selected, records.len());
                if let Some(pid) = self.pending_kill {
                    if !records.iter().any(|record| record.pid == pid) {
                        self.pending_kill = None;
                    }
                }
                self.processes = Some(Stamped::new(records, now));
            }
            Refreshed::Files { path, result } => {
                if path != self.browser.current_path() {
                    debug!(path = %path.display(), "discarding listing of a directory we left");
                    return;
                }
                match result {
                    Ok(entries) => {
                        self.file_selected = clamp_index(self.file_selected, entries.len());
                        self.files = Some(Stamped::new(entries, now));
                    }
                    Err(err) => {
                        warn!(%err, "listing directory failed");
                        self.report_browse_error(&err);
                    }
                }
            }
        }
    }

    // Processes

    fn selected_record(&self) -> Option<&ProcessRecord> {
        self.processes
            .as_ref()
            .and_then(|stamped| stamped.value().get(self.process_selected))
    }

    fn arm_kill(&mut self) {
        let Some(record) = self.selected_record() else {
            self.set_status(StatusLevel::Info, "No process selected".to_string());
            return;
        };
        let (pid, name) = (record.pid, record.name.clone());
        self.pending_kill = Some(pid);
        self.set_status(
            StatusLevel::Warning,
            format!("Terminate {} (pid {})? Press y to confirm", name, pid),
        );
    }

    fn confirm_kill(&mut self, input: Input) {
        let Some(pid) = self.pending_kill.take() else {
            return;
        };
        if !matches!(input, Input::Char(c) if c.eq_ignore_ascii_case(&'y')) {
            self.set_status(StatusLevel::Info, "Termination cancelled".to_string());
            return;
        }

        match self.sources.terminate(pid) {
            Ok(()) => {
                info!(pid, "process terminated");
                self.set_status(StatusLevel::Info, format!("Process {} terminated", pid));
            }
            Err(err) => {
                info!(pid, %err, "termination failed");
                let level = match err {
                    ProcessError::NotFound { .. } => StatusLevel::Warning,
                    _ => StatusLevel::Error,
                };
                self.set_status(level, err.to_string());
            }
        }
        self.request(Source::Processes);
    }

    // Files

    fn descend(&mut self) {
        let Some(entry) = self
            .files
            .as_ref()
            .and_then(|stamped| stamped.value().get(self.file_selected))
        else {
            return;
        };

        if !entry.is_directory {
            let err = BrowseError::not_navigable(
                self.browser.current_path().join(&entry.name),
                NavigationBlock::NotADirectory,
            );
            self.report_browse_error(&err);
            return;
        }

        let name = entry.name.clone();
        match self.sources.resolve_child(self.browser.current_path(), &name) {
            Ok(path) => self.navigate(path),
            Err(err) => self.report_browse_error(&err),
        }
    }

    fn ascend(&mut self) {
        let current = self.browser.current_path().to_path_buf();
        if self.sources.parent(&current) == current {
            self.set_status(StatusLevel::Info, "Already at the filesystem root".to_string());
            return;
        }
        match self.sources.resolve_child(&current, "..") {
            Ok(path) => self.navigate(path),
            Err(err) => self.report_browse_error(&err),
        }
    }

    fn go_home(&mut self) {
        let Some(home) = self.options.home.clone() else {
            self.set_status(StatusLevel::Warning, "No home directory known".to_string());
            return;
        };
        // "." validates the directory itself
        match self.sources.resolve_child(&home, ".") {
            Ok(path) => self.navigate(path),
            Err(err) => self.report_browse_error(&err),
        }
    }

    /// Move to an already validated directory and list it.
    fn navigate(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "changing directory");
        self.browser.commit(path);
        self.files = None;
        self.file_selected = 0;
        self.status = None;
        self.request(Source::Files);
    }

    fn report_browse_error(&mut self, err: &BrowseError) {
        let level = match err {
            BrowseError::NotNavigable { .. } => StatusLevel::Warning,
            BrowseError::Unreadable { .. } => StatusLevel::Error,
        };
        self.set_status(level, err.to_string());
    }

    // Terminal

    fn submit_command(&mut self) {
        let Some(command) = self.terminal.submit() else {
            return;
        };
        if command == "clear" {
            self.terminal.clear_output();
            return;
        }
        self.terminal.queue(command);
    }

    pub fn has_queued_command(&self) -> bool {
        self.terminal.queued().is_some()
    }

    /// Run the queued command to completion. Refresh waits until it is done.
    pub fn run_queued_command(&mut self) {
        let Some(command) = self.terminal.take_queued() else {
            return;
        };
        let result = self.sources.run(&command, self.options.command_timeout);
        info!(
            command = %result.command,
            status = ?result.status,
            elapsed = ?result.duration,
            "command finished"
        );
        match &result.status {
            CommandStatus::Exited(0) => {}
            CommandStatus::Exited(code) => {
                self.set_status(StatusLevel::Warning, format!("Exited with status {}", code));
            }
            CommandStatus::Signaled(signal) => {
                self.set_status(StatusLevel::Warning, format!("Killed by signal {}", signal));
            }
            CommandStatus::TimedOut => {
                self.set_status(
                    StatusLevel::Error,
                    format!(
                        "Timed out after {}",
                        crate::utils::format_elapsed(self.options.command_timeout)
                    ),
                );
            }
            CommandStatus::FailedToStart(reason) => {
                self.set_status(StatusLevel::Error, format!("Failed to start: {}", reason));
            }
        }
        self.terminal.show(result);
    }

    fn set_status(&mut self, level: StatusLevel, text: String) {
        self.status = Some(StatusMessage {
            level,
            text,
            at: Instant::now(),
        });
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// New selection after a navigation key, or `None` if the key is not one.
fn moved(selected: usize, len: usize, input: Input) -> Option<usize> {
    let last = len.saturating_sub(1);
    let index = match input {
        Input::Up => selected.saturating_sub(1),
        Input::Down => (selected + 1).min(last),
        Input::PageUp => selected.saturating_sub(TABLE_PAGE),
        Input::PageDown => (selected + TABLE_PAGE).min(last),
        Input::Home => 0,
        Input::End => last,
        _ => return None,
    };
    Some(index)
}

#[cfg(test)]
pub(crate) mod testing {
    //! An in-memory host for controller tests.

    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use chrono::Local;

    use crate::browser::FileEntry;
    use crate::error::{BrowseError, CollectorError, NavigationBlock, ProcessError};
    use crate::metrics::{LoadAverage, NetworkTotals, SystemSnapshot};
    use crate::processes::ProcessRecord;
    use crate::runner::{CommandResult, CommandStatus};
    use crate::sources::HostSources;

    pub fn snapshot() -> SystemSnapshot {
        SystemSnapshot {
            hostname: "testhost".to_string(),
            kernel_version: "6.1.0".to_string(),
            architecture: "x86_64".to_string(),
            uptime: Duration::from_secs(3 * 3600 + 120),
            cpu_percent: 12.5,
            cpu_count: 4,
            cpu_frequency_mhz: 2400,
            load_average: LoadAverage {
                one: 0.5,
                five: 0.4,
                fifteen: 0.3,
            },
            memory_total: 8 << 30,
            memory_used: 2 << 30,
            memory_available: 6 << 30,
            swap_total: 1 << 30,
            swap_used: 0,
            mount_point: PathBuf::from("/"),
            disk_total: 100 << 30,
            disk_used: 40 << 30,
            disk_free: 60 << 30,
            network: NetworkTotals::default(),
            taken_at: Local::now(),
        }
    }

    pub fn record(pid: u32, name: &str, cpu: f32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.to_string(),
            cpu_percent: cpu,
            memory_percent: 1.0,
            status: "Run".to_string(),
        }
    }

    fn entry(name: &str, is_directory: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_directory,
            size: if is_directory { 4096 } else { 12 },
            modified: None,
            permissions: "755".to_string(),
        }
    }

    /// Records every call; directory tree and processes are canned.
    pub struct FakeHost {
        pub sample_calls: usize,
        pub list_top_calls: Vec<usize>,
        pub terminated: Vec<u32>,
        pub commands: Vec<String>,
        pub fail_sample: bool,
        pub processes: Vec<ProcessRecord>,
        pub dirs: BTreeMap<PathBuf, Vec<FileEntry>>,
        pub command_status: CommandStatus,
    }

    impl Default for FakeHost {
        fn default() -> Self {
            let mut dirs = BTreeMap::new();
            dirs.insert(
                PathBuf::from("/"),
                vec![entry("home", true), entry("notes.txt", false)],
            );
            dirs.insert(PathBuf::from("/home"), vec![entry("user", true)]);
            dirs.insert(PathBuf::from("/home/user"), vec![entry("todo.md", false)]);

            Self {
                sample_calls: 0,
                list_top_calls: Vec::new(),
                terminated: Vec::new(),
                commands: Vec::new(),
                fail_sample: false,
                processes: vec![record(42, "busy", 50.0), record(7, "idle", 0.0)],
                dirs,
                command_status: CommandStatus::Exited(0),
            }
        }
    }

    impl HostSources for FakeHost {
        fn sample(&mut self) -> Result<SystemSnapshot, CollectorError> {
            self.sample_calls += 1;
            if self.fail_sample {
                return Err(CollectorError::Unavailable("memory"));
            }
            Ok(snapshot())
        }

        fn list_top(&mut self, n: usize) -> Vec<ProcessRecord> {
            self.list_top_calls.push(n);
            crate::processes::rank_top(self.processes.clone(), n)
        }

        fn terminate(&mut self, pid: u32) -> Result<(), ProcessError> {
            if let Some(index) = self.processes.iter().position(|r| r.pid == pid) {
                self.processes.remove(index);
                self.terminated.push(pid);
                Ok(())
            } else {
                Err(ProcessError::NotFound { pid })
            }
        }

        fn list(&self, path: &Path) -> Result<Vec<FileEntry>, BrowseError> {
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| BrowseError::Unreadable {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        }

        fn resolve_child(&self, current: &Path, name: &str) -> Result<PathBuf, BrowseError> {
            let target = match name {
                ".." => self.parent(current),
                "." => current.to_path_buf(),
                _ => current.join(name),
            };
            if self.dirs.contains_key(&target) {
                Ok(target)
            } else {
                Err(BrowseError::not_navigable(target, NavigationBlock::Missing))
            }
        }

        fn parent(&self, current: &Path) -> PathBuf {
            current
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| current.to_path_buf())
        }

        fn run(&mut self, command_line: &str, _timeout: Duration) -> CommandResult {
            self.commands.push(command_line.to_string());
            CommandResult {
                command: command_line.to_string(),
                status: self.command_status.clone(),
                output: format!("ran {}\n", command_line),
                truncated: false,
                duration: Duration::from_millis(5),
            }
        }
    }
}
