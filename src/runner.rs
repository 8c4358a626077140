//! One-shot shell command execution with a deadline and an output cap

use std::fs::File;
use std::io::Read;
use std::os::fd::OwnedFd;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use tracing::{debug, warn};

/// Default cap on captured output
pub const DEFAULT_OUTPUT_LIMIT: usize = 64 * 1024;

const WAIT_POLL: Duration = Duration::from_millis(10);

/// How long the reader gets to hit EOF once the group is killed
const DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommandStatus {
    Exited(i32),
    Signaled(i32),
    TimedOut,
    FailedToStart(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub command: String,
    pub status: CommandStatus,
    /// stdout and stderr, interleaved as written
    pub output: String,
    pub truncated: bool,
    pub duration: Duration,
}

impl CommandResult {
    /// Exit code, when the command ran to a normal exit.
    pub fn exit_status(&self) -> Option<i32> {
        match self.status {
            CommandStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.status == CommandStatus::TimedOut
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status() == Some(0)
    }

    fn failed_to_start(command: &str, reason: String, started: Instant) -> Self {
        Self {
            command: command.to_string(),
            status: CommandStatus::FailedToStart(reason),
            output: String::new(),
            truncated: false,
            duration: started.elapsed(),
        }
    }
}

/// Keeps the first `limit` bytes and counts the rest.
#[derive(Debug, Default)]
struct BoundedOutput {
    bytes: Vec<u8>,
    limit: usize,
    dropped: u64,
}

impl BoundedOutput {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        let kept = chunk.len().min(room);
        self.bytes.extend_from_slice(&chunk[..kept]);
        self.dropped += (chunk.len() - kept) as u64;
    }

    fn finish(self) -> (String, bool) {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        let truncated = self.dropped > 0;
        if truncated {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&format!("[output truncated: {} bytes omitted]", self.dropped));
        }
        (text, truncated)
    }
}

/// Runs a command line through the shell, one at a time.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: PathBuf,
    output_limit: usize,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(PathBuf::from("/bin/sh"), DEFAULT_OUTPUT_LIMIT)
    }
}

impl CommandRunner {
    pub fn new(shell: PathBuf, output_limit: usize) -> Self {
        Self {
            shell,
            output_limit,
        }
    }

    /// Run `command_line` to completion or until `timeout` elapses.
    ///
    /// The command gets its own process group so that a timeout can kill the
    /// shell together with everything it started. Output still being written
    /// past the deadline, by a job the group kill cannot reach, is abandoned
    /// and the result is `TimedOut`. Always returns a result; failures are
    /// reported through [`CommandStatus`].
    pub fn run(&self, command_line: &str, timeout: Duration) -> CommandResult {
        let started = Instant::now();
        let deadline = started + timeout;

        let (reader, writer) = match cloexec_pipe() {
            Ok(fds) => fds,
            Err(err) => {
                return CommandResult::failed_to_start(command_line, err.to_string(), started)
            }
        };

        let spawned = {
            let stderr = match writer.try_clone() {
                Ok(fd) => fd,
                Err(err) => {
                    return CommandResult::failed_to_start(
                        command_line,
                        err.to_string(),
                        started,
                    )
                }
            };
            let mut command = Command::new(&self.shell);
            command
                .arg("-c")
                .arg(command_line)
                .stdin(Stdio::null())
                .stdout(Stdio::from(writer))
                .stderr(Stdio::from(stderr))
                .process_group(0);
            command.spawn()
            // `command` drops here, closing our copies of the write end
        };

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                return CommandResult::failed_to_start(command_line, err.to_string(), started)
            }
        };
        debug!(pid = child.id(), command = command_line, "command started");

        let captured = Arc::new(Mutex::new(BoundedOutput::new(self.output_limit)));
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let sink = Arc::clone(&captured);
        thread::spawn(move || {
            let mut pipe = File::from(reader);
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        sink.lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(&chunk[..n]);
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = done_tx.send(());
        });

        let exit = wait_until(&mut child, deadline);
        let mut timed_out = exit.is_none();

        // A background job may still hold the pipe after the shell exits
        let remaining = deadline.saturating_duration_since(Instant::now());
        if done_rx.recv_timeout(remaining).is_err() {
            timed_out = true;
            kill_group(&child);
            if done_rx.recv_timeout(DRAIN_GRACE).is_err() {
                // Something outside the group holds the write end; stop waiting
                warn!(command = command_line, "output pipe still open after kill, detaching reader");
            }
        }
        if timed_out {
            warn!(command = command_line, ?timeout, "command timed out");
        }

        let output = std::mem::take(&mut *captured.lock().unwrap_or_else(PoisonError::into_inner));
        let (output, truncated) = output.finish();
        let status = match exit {
            Some(status) if !timed_out => classify(status),
            _ => CommandStatus::TimedOut,
        };

        CommandResult {
            command: command_line.to_string(),
            status,
            output,
            truncated,
            duration: started.elapsed(),
        }
    }
}

/// A pipe whose ends are not inherited by unrelated children spawned
/// concurrently; stdio redirection clears the flag on the child's copy.
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
    }
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        nix::unistd::pipe()
    }
}

/// Poll the child until it exits or the deadline passes; on timeout the group
/// is killed and reaped, and `None` is returned.
fn wait_until(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() >= deadline => {
                kill_group(child);
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(WAIT_POLL),
            Err(err) => {
                warn!(%err, "waiting on command failed");
                kill_group(child);
                let _ = child.wait();
                return None;
            }
        }
    }
}

fn kill_group(child: &Child) {
    let Ok(raw) = i32::try_from(child.id()) else {
        return;
    };
    // The child leads its own group, so its pid is the group id
    if let Err(err) = signal::killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(%err, "killpg after command");
    }
}

fn classify(status: ExitStatus) -> CommandStatus {
    match (status.code(), status.signal()) {
        (Some(code), _) => CommandStatus::Exited(code),
        (None, Some(signal)) => CommandStatus::Signaled(signal),
        (None, None) => CommandStatus::Exited(-1),
    }
}
