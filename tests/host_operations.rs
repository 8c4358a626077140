//! Tests against the real host: shell commands, signals and the filesystem.

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use hostwatch::browser::DirectoryBrowser;
use hostwatch::error::{BrowseError, NavigationBlock, ProcessError};
use hostwatch::metrics::MetricsCollector;
use hostwatch::processes::ProcessRegistry;
use hostwatch::runner::{CommandRunner, CommandStatus};
use hostwatch::sources::{HostSources, SystemSources};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

fn runner() -> CommandRunner {
    CommandRunner::default()
}

#[test]
fn test_true_exits_zero_quickly() {
    let result = runner().run("true", Duration::from_secs(1));
    assert_eq!(result.status, CommandStatus::Exited(0));
    assert_eq!(result.exit_status(), Some(0));
    assert_eq!(result.output, "");
    assert!(!result.truncated);
    assert!(result.duration < Duration::from_secs(1));
}

#[test]
fn test_sleep_times_out_after_deadline() {
    let started = Instant::now();
    let result = runner().run("sleep 10", Duration::from_secs(1));
    let elapsed = started.elapsed();

    assert!(result.timed_out());
    assert_eq!(result.exit_status(), None);
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[test]
fn test_stdout_and_stderr_are_combined() {
    let result = runner().run("echo out; echo err 1>&2", Duration::from_secs(5));
    assert!(result.succeeded());
    assert_eq!(result.output, "out\nerr\n");
}

#[test]
fn test_exit_code_and_signal_are_reported() {
    let result = runner().run("exit 3", Duration::from_secs(5));
    assert_eq!(result.status, CommandStatus::Exited(3));

    let result = runner().run("kill -9 $$", Duration::from_secs(5));
    assert_eq!(result.status, CommandStatus::Signaled(9));
}

#[test]
fn test_output_is_truncated_with_marker() {
    let runner = CommandRunner::new(PathBuf::from("/bin/sh"), 16);
    let result = runner.run("head -c 100 /dev/zero | tr '\\000' a", Duration::from_secs(5));
    assert!(result.succeeded());
    assert!(result.truncated);
    assert_eq!(
        result.output,
        format!("{}\n[output truncated: 84 bytes omitted]", "a".repeat(16))
    );
}

#[test]
fn test_background_job_does_not_hang_the_runner() {
    let started = Instant::now();
    let result = runner().run("echo started; sleep 10 &", Duration::from_secs(1));
    // The job kept the pipe open past the deadline
    assert!(result.timed_out());
    assert_eq!(result.output, "started\n");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_job_outside_the_group_does_not_hang_the_runner() {
    if Command::new("setsid").arg("true").status().is_err() {
        return;
    }

    let started = Instant::now();
    let result = runner().run("echo detached; setsid sleep 5 &", Duration::from_secs(1));
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(3), "runner blocked {:?}", elapsed);
    assert!(result.timed_out());
    assert_eq!(result.output, "detached\n");
}

#[test]
fn test_missing_shell_fails_to_start() {
    let runner = CommandRunner::new(PathBuf::from("/nonexistent/shell"), 1024);
    let result = runner.run("true", Duration::from_secs(1));
    assert!(matches!(result.status, CommandStatus::FailedToStart(_)));
}

#[test]
fn test_terminate_child_then_not_found_twice() {
    let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
    let pid = child.id();
    let mut registry = ProcessRegistry::new(Duration::from_secs(2));

    registry.terminate(pid).expect("terminate sleep");
    child.wait().expect("reap sleep");

    for _ in 0..2 {
        match registry.terminate(pid) {
            Err(ProcessError::NotFound { pid: reported }) => assert_eq!(reported, pid),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}

#[test]
fn test_terminate_ignoring_child_times_out() {
    let mut child = Command::new("sh")
        .args(["-c", "trap '' TERM; sleep 30"])
        .process_group(0)
        .spawn()
        .expect("spawn sh");
    // Give the shell a moment to install the trap
    std::thread::sleep(Duration::from_millis(200));

    let mut registry = ProcessRegistry::new(Duration::from_millis(300));
    let err = registry.terminate(child.id()).unwrap_err();
    assert!(matches!(err, ProcessError::TerminationTimeout { .. }));

    // The ignored TERM is inherited by sleep, so take down the whole group
    let group = Pid::from_raw(child.id() as i32);
    signal::killpg(group, Signal::SIGKILL).expect("kill group");
    child.wait().expect("reap sh");
}

#[test]
fn test_system_sources_through_the_trait() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("file.txt"), b"data").unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();

    let mut sources = SystemSources::new(
        MetricsCollector::new("/"),
        ProcessRegistry::new(Duration::from_secs(1)),
        CommandRunner::default(),
    );

    let snapshot = sources.sample().expect("sample");
    assert!(snapshot.memory_used <= snapshot.memory_total);
    assert!(snapshot.disk_used <= snapshot.disk_total);

    let top = sources.list_top(3);
    assert!(top.len() <= 3);

    let entries = sources.list(&root).expect("list");
    assert_eq!(entries[0].name, "sub");
    assert!(entries[0].is_directory);

    assert_eq!(sources.resolve_child(&root, "sub").unwrap(), root.join("sub"));
    assert!(matches!(
        sources.resolve_child(&root, "file.txt"),
        Err(BrowseError::NotNavigable {
            reason: NavigationBlock::NotADirectory,
            ..
        })
    ));
    assert_eq!(sources.parent(&root.join("sub")), root);

    let result = sources.run("printf hi", Duration::from_secs(5));
    assert_eq!(result.output, "hi");
}

#[test]
fn test_unreadable_directory_is_rejected() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not stop root
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = DirectoryBrowser::new().resolve_child(dir.path(), "locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(
        result,
        Err(BrowseError::NotNavigable {
            reason: NavigationBlock::Unreadable,
            ..
        })
    ));
}
