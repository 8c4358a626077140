//! Process listing and termination

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as UnixPid;
use serde::Serialize;
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, info};

use crate::error::ProcessError;

/// Number of processes shown by default
pub const DEFAULT_TOP: usize = 15;

/// How often liveness is re-checked while waiting out the grace period
const TERMINATE_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub status: String,
}

/// Sort by CPU descending, ties by pid ascending, and keep the first `n`.
pub fn rank_top(mut records: Vec<ProcessRecord>, n: usize) -> Vec<ProcessRecord> {
    records.sort_by(compare_records);
    records.truncate(n);
    records
}

fn compare_records(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    b.cpu_percent
        .total_cmp(&a.cpu_percent)
        .then_with(|| a.pid.cmp(&b.pid))
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Snapshots running processes and sends termination requests.
pub struct ProcessRegistry {
    system: System,
    grace: Duration,
}

impl ProcessRegistry {
    pub fn new(grace: Duration) -> Self {
        Self {
            system: System::new(),
            grace,
        }
    }

    /// The `n` busiest processes.
    ///
    /// Processes that exit while being read are simply absent from the result.
    /// CPU figures are deltas since the previous call, so the first call
    /// reports 0 for every process.
    pub fn list_top(&mut self, n: usize) -> Vec<ProcessRecord> {
        self.system.refresh_memory();
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let total_memory = self.system.total_memory();
        let records: Vec<ProcessRecord> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let memory_percent = if total_memory > 0 {
                    (process.memory() as f64 / total_memory as f64 * 100.0) as f32
                } else {
                    0.0
                };
                ProcessRecord {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().to_string(),
                    cpu_percent: finite_or_zero(process.cpu_usage()),
                    memory_percent: finite_or_zero(memory_percent),
                    status: process.status().to_string(),
                }
            })
            .collect();

        rank_top(records, n)
    }

    /// Send SIGTERM and wait up to the grace period for the process to go.
    ///
    /// A pid that no longer exists reports `NotFound` every time it is asked
    /// about, so repeating a request is harmless.
    pub fn terminate(&mut self, pid: u32) -> Result<(), ProcessError> {
        let target = signal_target(pid)?;

        match signal::kill(target, Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Err(ProcessError::NotFound { pid }),
            Err(Errno::EPERM) => return Err(ProcessError::PermissionDenied { pid }),
            Err(source) => return Err(ProcessError::Signal { pid, source }),
        }
        info!(pid, "sent SIGTERM");

        let deadline = Instant::now() + self.grace;
        loop {
            if !self.is_alive(pid, target) {
                debug!(pid, "process gone");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ProcessError::TerminationTimeout {
                    pid,
                    grace: self.grace,
                });
            }
            std::thread::sleep(TERMINATE_POLL);
        }
    }

    /// A zombie has already exited; it only waits for its parent to reap it.
    fn is_alive(&mut self, pid: u32, target: UnixPid) -> bool {
        match signal::kill(target, None::<Signal>) {
            Err(Errno::ESRCH) => return false,
            Ok(()) | Err(_) => {}
        }

        let sys_pid = Pid::from_u32(pid);
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        self.system
            .process(sys_pid)
            .map_or(true, |process| process.status() != ProcessStatus::Zombie)
    }
}

/// Validate a pid before it is ever handed to kill(2).
///
/// Pid 0 and negative values address process groups, and signalling our own
/// pid would take the monitor down.
fn signal_target(pid: u32) -> Result<UnixPid, ProcessError> {
    if pid == 0 {
        return Err(ProcessError::Refused {
            pid,
            reason: "pid 0 addresses a process group",
        });
    }
    if pid == std::process::id() {
        return Err(ProcessError::Refused {
            pid,
            reason: "that is this monitor",
        });
    }
    let raw = i32::try_from(pid).map_err(|_| ProcessError::Refused {
        pid,
        reason: "pid out of range",
    })?;
    Ok(UnixPid::from_raw(raw))
}
