//! Off-thread sampling for front ends that cannot block their render thread
//!
//! The worker owns a fetch closure on a background thread. Requests go in
//! through a cloneable handle with the same drop-latest-if-busy rule the
//! cooperative loop uses; finished results are collected with
//! [`RefreshWorker::try_results`] and handed to `Controller::apply`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use crate::controller::{Refreshed, Source};

#[derive(Debug, Default)]
struct Flags {
    busy: [AtomicBool; 3],
    dropped: AtomicU64,
}

#[derive(Clone)]
pub struct RefreshWorker {
    flags: Arc<Flags>,
    requests: mpsc::Sender<Source>,
    results: Arc<Mutex<mpsc::Receiver<Refreshed>>>,
}

impl RefreshWorker {
    /// Start the sampling thread. It exits once every handle is dropped.
    pub fn spawn<F>(mut fetch: F) -> std::io::Result<Self>
    where
        F: FnMut(Source) -> Refreshed + Send + 'static,
    {
        let flags = Arc::new(Flags::default());
        let (request_tx, request_rx) = mpsc::channel::<Source>();
        let (result_tx, result_rx) = mpsc::channel();

        let worker_flags = Arc::clone(&flags);
        thread::Builder::new()
            .name("hostwatch-refresh".to_string())
            .spawn(move || {
                for source in request_rx {
                    let refreshed = fetch(source);
                    worker_flags.busy[source.index()].store(false, Ordering::Release);
                    if result_tx.send(refreshed).is_err() {
                        break;
                    }
                }
                debug!("refresh worker stopped");
            })?;

        Ok(Self {
            flags,
            requests: request_tx,
            results: Arc::new(Mutex::new(result_rx)),
        })
    }

    /// Queue a fetch unless one for `source` is still in flight.
    pub fn request(&self, source: Source) -> bool {
        let busy = &self.flags.busy[source.index()];
        if busy.swap(true, Ordering::AcqRel) {
            self.flags.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        if self.requests.send(source).is_err() {
            warn!(source = source.label(), "refresh worker is gone");
            busy.store(false, Ordering::Release);
            return false;
        }
        true
    }

    pub fn is_busy(&self, source: Source) -> bool {
        self.flags.busy[source.index()].load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.flags.dropped.load(Ordering::Relaxed)
    }

    /// Every result finished since the last call, without blocking.
    pub fn try_results(&self) -> Vec<Refreshed> {
        let receiver = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::ProcessRecord;
    use std::time::{Duration, Instant};

    fn wait_for_results(worker: &RefreshWorker, count: usize) -> Vec<Refreshed> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut collected = Vec::new();
        while collected.len() < count && Instant::now() < deadline {
            collected.extend(worker.try_results());
            thread::sleep(Duration::from_millis(5));
        }
        collected
    }

    #[test]
    fn test_busy_source_drops_new_requests() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let worker = RefreshWorker::spawn(move |_source| {
            let _ = gate_rx.recv();
            Refreshed::Processes(Vec::<ProcessRecord>::new())
        })
        .unwrap();

        assert!(worker.request(Source::Processes));
        assert!(!worker.request(Source::Processes));
        assert!(worker.is_busy(Source::Processes));
        assert_eq!(worker.dropped(), 1);

        gate_tx.send(()).unwrap();
        let results = wait_for_results(&worker, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::Processes);

        assert!(!worker.is_busy(Source::Processes));
        assert!(worker.request(Source::Processes));
        gate_tx.send(()).unwrap();
        assert_eq!(wait_for_results(&worker, 1).len(), 1);
    }

    #[test]
    fn test_results_apply_to_controller() {
        use crate::browser::BrowserState;
        use crate::controller::testing::{snapshot, FakeHost};
        use crate::controller::{Controller, ControllerOptions};
        use std::path::PathBuf;

        let worker = RefreshWorker::spawn(|source| match source {
            Source::System => Refreshed::System(Ok(snapshot())),
            _ => Refreshed::Processes(Vec::new()),
        })
        .unwrap();
        let mut controller = Controller::new(
            FakeHost::default(),
            BrowserState::for_tests(PathBuf::from("/")),
            ControllerOptions::default(),
        );
        assert!(controller.system().is_none());

        worker.request(Source::System);
        for refreshed in wait_for_results(&worker, 1) {
            controller.apply(refreshed);
        }
        let system = controller.system().expect("applied snapshot");
        assert_eq!(system.value().hostname, "testhost");
        assert_eq!(controller.sources().sample_calls, 0);
    }

    #[test]
    fn test_clones_share_one_guard() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let worker = RefreshWorker::spawn(move |_source| {
            let _ = gate_rx.recv();
            Refreshed::Processes(Vec::new())
        })
        .unwrap();
        let other = worker.clone();

        assert!(worker.request(Source::Processes));
        assert!(!other.request(Source::Processes));
        assert_eq!(other.dropped(), 1);

        gate_tx.send(()).unwrap();
        assert_eq!(wait_for_results(&other, 1).len(), 1);
    }
}
