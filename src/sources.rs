//! The collaborator seam between the controller and the OS

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::{DirectoryBrowser, FileEntry};
use crate::error::{BrowseError, CollectorError, ProcessError};
use crate::metrics::{MetricsCollector, SystemSnapshot};
use crate::processes::{ProcessRecord, ProcessRegistry};
use crate::runner::{CommandResult, CommandRunner};

/// Everything the controller asks of the host.
///
/// Front ends never talk to the OS directly; they render controller state
/// and the controller goes through this trait. Tests substitute a fake.
pub trait HostSources {
    fn sample(&mut self) -> Result<SystemSnapshot, CollectorError>;

    fn list_top(&mut self, n: usize) -> Vec<ProcessRecord>;

    fn terminate(&mut self, pid: u32) -> Result<(), ProcessError>;

    fn list(&self, path: &Path) -> Result<Vec<FileEntry>, BrowseError>;

    fn resolve_child(&self, current: &Path, name: &str) -> Result<PathBuf, BrowseError>;

    fn parent(&self, current: &Path) -> PathBuf;

    fn run(&mut self, command_line: &str, timeout: Duration) -> CommandResult;
}

/// The real host: sysinfo, nix and the shell.
pub struct SystemSources {
    metrics: MetricsCollector,
    processes: ProcessRegistry,
    browser: DirectoryBrowser,
    runner: CommandRunner,
}

impl SystemSources {
    pub fn new(metrics: MetricsCollector, processes: ProcessRegistry, runner: CommandRunner) -> Self {
        Self {
            metrics,
            processes,
            browser: DirectoryBrowser::new(),
            runner,
        }
    }
}

impl HostSources for SystemSources {
    fn sample(&mut self) -> Result<SystemSnapshot, CollectorError> {
        self.metrics.sample()
    }

    fn list_top(&mut self, n: usize) -> Vec<ProcessRecord> {
        self.processes.list_top(n)
    }

    fn terminate(&mut self, pid: u32) -> Result<(), ProcessError> {
        self.processes.terminate(pid)
    }

    fn list(&self, path: &Path) -> Result<Vec<FileEntry>, BrowseError> {
        self.browser.list(path)
    }

    fn resolve_child(&self, current: &Path, name: &str) -> Result<PathBuf, BrowseError> {
        self.browser.resolve_child(current, name)
    }

    fn parent(&self, current: &Path) -> PathBuf {
        self.browser.parent(current)
    }

    fn run(&mut self, command_line: &str, timeout: Duration) -> CommandResult {
        self.runner.run(command_line, timeout)
    }
}
