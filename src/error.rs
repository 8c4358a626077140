//! Error types for every data source and for startup.
//!
//! Per-operation errors (`CollectorError`, `ProcessError`, `BrowseError`) are
//! never fatal: the controller turns them into a status line. Only
//! `StartupError` ends the process.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A metric could not be read from the OS.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("cannot read host identity: {0}")]
    Identity(#[source] nix::Error),

    #[error("cannot read disk usage for {}: {source}", path.display())]
    Disk {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("{0} counters are unavailable")]
    Unavailable(&'static str),
}

/// Outcome of a failed termination request.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no such process: {pid}")]
    NotFound { pid: u32 },

    #[error("permission denied to signal process {pid}")]
    PermissionDenied { pid: u32 },

    #[error("process {pid} still alive {}ms after SIGTERM", grace.as_millis())]
    TerminationTimeout { pid: u32, grace: Duration },

    #[error("refusing to signal process {pid}: {reason}")]
    Refused { pid: u32, reason: &'static str },

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },
}

impl ProcessError {
    pub fn pid(&self) -> u32 {
        match self {
            Self::NotFound { pid }
            | Self::PermissionDenied { pid }
            | Self::TerminationTimeout { pid, .. }
            | Self::Refused { pid, .. }
            | Self::Signal { pid, .. } => *pid,
        }
    }
}

/// Why a path cannot become the browser's current directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationBlock {
    Missing,
    NotADirectory,
    Unreadable,
}

impl std::fmt::Display for NavigationBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Missing => "does not exist",
            Self::NotADirectory => "is not a directory",
            Self::Unreadable => "cannot be read",
        };
        f.write_str(text)
    }
}

/// Filesystem browsing failures.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("{} {reason}", path.display())]
    NotNavigable {
        path: PathBuf,
        reason: NavigationBlock,
    },

    #[error("cannot list {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BrowseError {
    pub fn not_navigable(path: impl Into<PathBuf>, reason: NavigationBlock) -> Self {
        Self::NotNavigable {
            path: path.into(),
            reason,
        }
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Conditions that prevent the monitor from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("this host is not supported: {0}")]
    UnsupportedHost(&'static str),

    #[error("standard output is not an interactive terminal (use --dump for non-interactive output)")]
    NotATerminal,

    #[error("terminal setup failed: {0}")]
    Terminal(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("start directory rejected: {0}")]
    StartDirectory(#[source] BrowseError),
}
