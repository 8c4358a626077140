//! Data sources, stamped snapshots and the refresh-in-flight guard

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::browser::FileEntry;
use crate::error::{BrowseError, CollectorError};
use crate::metrics::SystemSnapshot;
use crate::processes::ProcessRecord;

/// A refreshable data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    System,
    Processes,
    Files,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::System, Source::Processes, Source::Files];

    pub(crate) fn index(self) -> usize {
        match self {
            Source::System => 0,
            Source::Processes => 1,
            Source::Files => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::System => "system metrics",
            Source::Processes => "process list",
            Source::Files => "directory listing",
        }
    }
}

/// The outcome of fetching one source, ready to be applied to the controller.
#[derive(Debug)]
pub enum Refreshed {
    System(Result<SystemSnapshot, CollectorError>),
    Processes(Vec<ProcessRecord>),
    Files {
        path: PathBuf,
        result: Result<Vec<FileEntry>, BrowseError>,
    },
}

impl Refreshed {
    pub fn source(&self) -> Source {
        match self {
            Refreshed::System(_) => Source::System,
            Refreshed::Processes(_) => Source::Processes,
            Refreshed::Files { .. } => Source::Files,
        }
    }
}

/// An immutable value plus the instant it was taken.
///
/// Replaced whole on every refresh; renderers only ever see a complete one.
#[derive(Debug)]
pub struct Stamped<T> {
    value: Arc<T>,
    at: Instant,
}

impl<T> Clone for Stamped<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            at: self.at,
        }
    }
}

impl<T> Stamped<T> {
    pub fn new(value: T, at: Instant) -> Self {
        Self {
            value: Arc::new(value),
            at,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn shared(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.at)
    }
}

/// Drop-latest-if-busy: at most one outstanding request per source, and at
/// most one manual request per source within a window.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    pending: [bool; 3],
    last_manual: [Option<Instant>; 3],
    dropped: u64,
}

impl RefreshGuard {
    /// Returns false, and counts a drop, when the source is already pending.
    pub fn request(&mut self, source: Source) -> bool {
        let slot = &mut self.pending[source.index()];
        if *slot {
            self.dropped += 1;
            return false;
        }
        *slot = true;
        true
    }

    /// A user-initiated request. Dropped, and counted, when another manual
    /// request for the source was accepted less than `window` before `now`.
    pub fn request_manual(&mut self, source: Source, now: Instant, window: Duration) -> bool {
        let last = &mut self.last_manual[source.index()];
        if let Some(at) = *last {
            if now.saturating_duration_since(at) < window {
                self.dropped += 1;
                return false;
            }
        }
        *last = Some(now);
        self.request(source)
    }

    pub fn is_pending(&self, source: Source) -> bool {
        self.pending[source.index()]
    }

    pub fn any_pending(&self) -> bool {
        self.pending.iter().any(|p| *p)
    }

    /// Pending sources in fixed order; clears them all.
    pub fn take(&mut self) -> Vec<Source> {
        let taken = Source::ALL
            .into_iter()
            .filter(|source| self.pending[source.index()])
            .collect();
        self.pending = [false; 3];
        taken
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
